//! TOML configuration for the `tfe` binary.
//!
//! Every section and key is optional:
//!
//! ```toml
//! [game]
//! spawn_two_probability = 0.9
//! win_exponent = 11
//!
//! [search]
//! prob_cutoff = 0.0001
//! min_depth = 3
//! max_depth = 12
//! time_budget_ms = 200
//! cache_capacity = 500000
//!
//! [store]
//! path = "tfe.bin"
//! resume = true
//! suspend_on_stop = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::expectimax::ExpectimaxConfig;
use crate::game::GameConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub search: ExpectimaxConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Save file; no persistence when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Continue a suspended game on start.
    #[serde(default = "defaults::resume")]
    pub resume: bool,
    /// Save the position when a run stops before game over.
    #[serde(default = "defaults::suspend_on_stop")]
    pub suspend_on_stop: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: None, resume: defaults::resume(), suspend_on_stop: defaults::suspend_on_stop() }
    }
}

impl Config {
    /// Read and validate a config file.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.game.spawn_two_probability;
        if !(p > 0.0 && p <= 1.0) {
            return Err(ConfigError::Invalid(format!("game.spawn_two_probability must be in (0, 1], got {p}")));
        }
        if !(1..=15).contains(&self.game.win_exponent) {
            return Err(ConfigError::Invalid(format!(
                "game.win_exponent must be in 1..=15, got {}",
                self.game.win_exponent
            )));
        }
        let s = &self.search;
        if s.min_depth < 1 || s.max_depth < 1 {
            return Err(ConfigError::Invalid("search depths must be at least 1".into()));
        }
        if s.min_depth > s.max_depth {
            return Err(ConfigError::Invalid(format!(
                "search.min_depth ({}) exceeds search.max_depth ({})",
                s.min_depth, s.max_depth
            )));
        }
        if !(s.prob_cutoff >= 0.0 && s.prob_cutoff < 1.0) {
            return Err(ConfigError::Invalid(format!("search.prob_cutoff must be in [0, 1), got {}", s.prob_cutoff)));
        }
        if s.cache_capacity == 0 {
            return Err(ConfigError::Invalid("search.cache_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Search settings with the spawn odds taken from the game section.
    pub fn search_config(&self) -> ExpectimaxConfig {
        ExpectimaxConfig { spawn_two_probability: self.game.spawn_two_probability, ..self.search.clone() }
    }
}

mod defaults {
    pub fn resume() -> bool {
        true
    }

    pub fn suspend_on_stop() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.game.win_exponent, 11);
        assert_eq!(cfg.search.max_depth, 12);
        assert!(cfg.store.resume);
        assert_eq!(cfg.store.path, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [game]
            spawn_two_probability = 0.75

            [search]
            max_depth = 6
            time_budget_ms = 50

            [store]
            path = "scores.bin"
            suspend_on_stop = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.game.win_exponent, 11);
        assert_eq!(cfg.search.max_depth, 6);
        assert_eq!(cfg.search.min_depth, 3);
        assert_eq!(cfg.search.time_budget().as_millis(), 50);
        assert_eq!(cfg.store.path.as_deref(), Some(Path::new("scores.bin")));
        assert!(cfg.store.resume);
        assert!(!cfg.store.suspend_on_stop);

        // the search never reads its own copy of the spawn odds from TOML
        assert_eq!(cfg.search.spawn_two_probability, 0.9);
        assert_eq!(cfg.search_config().spawn_two_probability, 0.75);
        assert_eq!(cfg.search_config().max_depth, 6);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for bad in [
            "[game]\nspawn_two_probability = 0.0",
            "[game]\nspawn_two_probability = 1.5",
            "[game]\nwin_exponent = 0",
            "[game]\nwin_exponent = 16",
            "[search]\nmin_depth = 0",
            "[search]\nmin_depth = 5\nmax_depth = 4",
            "[search]\ncache_capacity = 0",
            "[search]\nprob_cutoff = 1.0",
        ] {
            assert!(matches!(Config::from_toml_str(bad), Err(ConfigError::Invalid(_))), "{bad}");
        }
        assert!(Config::from_toml_str("[game]\nspawn_two_probability = 1.0").is_ok());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(Config::from_toml_str("[search\nmax_depth = 3"), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::from_toml_str("[search]\nmax_depth = \"deep\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn reads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[search]\nmin_depth = 2").unwrap();
        let cfg = Config::from_toml(f.path()).unwrap();
        assert_eq!(cfg.search.min_depth, 2);

        let missing = f.path().with_extension("missing");
        assert!(matches!(Config::from_toml(missing), Err(ConfigError::Io(_))));
    }
}
