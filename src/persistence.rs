//! High-score and saved-game persistence.
//!
//! On-disk layout of a [`FileStore`] (all integers little-endian):
//!
//! ```text
//! "TFE1" | version u8 | postcard(SaveRecord) | crc32c u32
//! ```
//!
//! The checksum covers every byte before it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::Score;
use crate::game::GameState;

const MAGIC: &[u8; 4] = b"TFE1";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1;
const TRAILER_LEN: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
}

impl StoreError {
    /// True when the bytes were read but are not a valid record.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            StoreError::Postcard(_) | StoreError::MagicOrVersion | StoreError::Malformed | StoreError::Checksum
        )
    }
}

/// Where high scores, counters and a suspended game live between runs.
pub trait ScoreStore {
    /// Best score recorded so far; 0 when nothing has been stored.
    fn load_high_score(&self) -> Result<Score, StoreError>;
    /// Count a finished game and raise the high score if `score` beats it.
    fn record_game(&mut self, score: Score, won: bool) -> Result<(), StoreError>;
    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError>;
    fn load_state(&self) -> Result<Option<GameState>, StoreError>;
    fn clear_state(&mut self) -> Result<(), StoreError>;
}

/// Everything a store keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub high_score: Score,
    pub games_played: u64,
    pub games_won: u64,
    pub saved: Option<GameState>,
}

impl SaveRecord {
    fn record_game(&mut self, score: Score, won: bool) {
        self.high_score = self.high_score.max(score);
        self.games_played += 1;
        if won {
            self.games_won += 1;
        }
    }
}

/// In-process store; forgets everything on drop.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    record: SaveRecord,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &SaveRecord {
        &self.record
    }
}

impl ScoreStore for MemoryStore {
    fn load_high_score(&self) -> Result<Score, StoreError> {
        Ok(self.record.high_score)
    }

    fn record_game(&mut self, score: Score, won: bool) -> Result<(), StoreError> {
        self.record.record_game(score, won);
        Ok(())
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        self.record.saved = Some(*state);
        Ok(())
    }

    fn load_state(&self) -> Result<Option<GameState>, StoreError> {
        Ok(self.record.saved)
    }

    fn clear_state(&mut self) -> Result<(), StoreError> {
        self.record.saved = None;
        Ok(())
    }
}

/// Store backed by a single checksummed file.
///
/// Every operation reads the file afresh, so two handles on the same path
/// see each other's writes.
///
/// ```
/// use tfe::persistence::{FileStore, ScoreStore};
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = FileStore::new(dir.path().join("scores.bin"));
/// assert_eq!(store.load_high_score().unwrap(), 0);
/// store.record_game(1024, false).unwrap();
/// assert_eq!(store.load_high_score().unwrap(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current record; a missing file reads as an empty one.
    pub fn read(&self) -> Result<SaveRecord, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => decode_record(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SaveRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file atomically: write a sibling, then rename over.
    pub fn write(&self, record: &SaveRecord) -> Result<(), StoreError> {
        let data = encode_record(record)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&data)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read-modify-write. A corrupt file is replaced by a fresh record.
    fn update(&self, f: impl FnOnce(&mut SaveRecord)) -> Result<(), StoreError> {
        let mut record = match self.read() {
            Err(e) if e.is_corrupt() => {
                log::warn!("{} is corrupt ({e}), starting a new record", self.path.display());
                SaveRecord::default()
            }
            other => other?,
        };
        f(&mut record);
        self.write(&record)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ScoreStore for FileStore {
    fn load_high_score(&self) -> Result<Score, StoreError> {
        Ok(self.read()?.high_score)
    }

    fn record_game(&mut self, score: Score, won: bool) -> Result<(), StoreError> {
        self.update(|r| r.record_game(score, won))
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        let state = *state;
        self.update(|r| r.saved = Some(state))
    }

    fn load_state(&self) -> Result<Option<GameState>, StoreError> {
        Ok(self.read()?.saved)
    }

    fn clear_state(&mut self) -> Result<(), StoreError> {
        self.update(|r| r.saved = None)
    }
}

pub fn encode_record(record: &SaveRecord) -> Result<Vec<u8>, StoreError> {
    let payload = postcard::to_allocvec(record)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&payload);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn decode_record(bytes: &[u8]) -> Result<SaveRecord, StoreError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(StoreError::Malformed);
    }
    // checksum first, so a torn write never reaches the decoder
    let (content, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(StoreError::Checksum);
    }
    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(StoreError::MagicOrVersion);
    }
    let (record, rest) = postcard::take_from_bytes::<SaveRecord>(&content[HEADER_LEN..])?;
    if !rest.is_empty() {
        return Err(StoreError::Malformed);
    }
    Ok(record)
}
