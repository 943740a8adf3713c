use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use tfe::config::Config;
use tfe::engine::{self, Board, Move};
use tfe::expectimax::Expectimax;
use tfe::game::{Game, LogObserver};
use tfe::persistence::{FileStore, MemoryStore, ScoreStore};
use tfe::session::{Limits, Outcome, Session};

#[derive(Debug, Parser)]
#[command(name = "tfe", about = "2048 with an Expectimax agent")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Let the agent play one game
    Play {
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for tile spawns (default: OS entropy)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Stop once score >= this value
        #[arg(long)]
        stop_score: Option<u64>,
        /// Stop once highest tile >= this value
        #[arg(long)]
        stop_tile: Option<u32>,
        /// Save file for high scores and suspended games (overrides the config)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Print the board after every move
        #[arg(long)]
        print: bool,
        /// Suppress the spinner status line
        #[arg(long)]
        quiet: bool,
    },
    /// Print the agent's choice for one position
    Suggest {
        /// Packed board of 16 hex exponents, e.g. 0x1100000000000200
        #[arg(long)]
        board: String,
        /// Nibble order of --board
        #[arg(long, value_enum, default_value_t = Layout::Grid)]
        layout: Layout,
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.cmd {
        Cmd::Play { config, seed, steps, stop_score, stop_tile, store, print, quiet } => {
            let cfg = load_config(config.as_ref())?;
            let limits = Limits { max_moves: steps, stop_score, stop_tile };
            let opts = PlayOpts { seed, print, quiet };
            match store.or_else(|| cfg.store.path.clone()) {
                Some(path) => play(&cfg, FileStore::new(path), true, &limits, &opts),
                None => play(&cfg, MemoryStore::new(), false, &limits, &opts),
            }
        }
        Cmd::Suggest { board, layout, config } => {
            let cfg = load_config(config.as_ref())?;
            suggest(&cfg, &board, layout)
        }
    }
}

/// Bit order of a packed board on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layout {
    /// Top-left cell in the most significant nibble; the hex reads like the grid
    Grid,
    /// Cell `4 * row + col` at bits `4i..4i+3`; top-left cell in the lowest nibble
    LsbFirst,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::from_toml(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(Config::default()),
    }
}

struct PlayOpts {
    seed: Option<u64>,
    print: bool,
    quiet: bool,
}

fn play<S: ScoreStore>(
    cfg: &Config,
    store: S,
    persistent: bool,
    limits: &Limits,
    opts: &PlayOpts,
) -> anyhow::Result<()> {
    let tables = engine::init();
    let rng = match opts.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::with_rng(tables, cfg.game, rng);
    game.add_observer(&LogObserver);
    let agent = Expectimax::with_config(tables, cfg.search_config());
    let mut session = Session::new(game, agent, store);

    if persistent && cfg.store.resume && session.resume() {
        info!("resumed saved game at score {}", session.game().score());
    }
    if opts.print {
        println!("{}", session.game().board());
    }

    let pb = (!opts.quiet && !opts.print).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let start = Instant::now();
    let mut moves = 0u64;
    let report = session
        .run_with(limits, |dir: Move, game| {
            moves += 1;
            if opts.print {
                println!("{dir:?}\n{}", game.board());
            }
            if let Some(pb) = &pb {
                if moves % 10 == 0 {
                    let rate = moves as f64 / start.elapsed().as_secs_f64().max(1e-6);
                    pb.set_message(format!("{moves} | moves/sec: {rate:.1} | score: {}", game.score()));
                }
            }
        })
        .context("recording game")?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if persistent && cfg.store.suspend_on_stop && report.outcome != Outcome::GameOver {
        session.suspend().context("saving game")?;
        info!("game suspended; run again to resume");
    }

    let stats = session.agent().last_stats();
    println!(
        "{:?}: moves {} | score {} | high score {} | highest tile {} | won {} | {:.1}s | peak nodes {}",
        report.outcome,
        report.moves,
        report.score,
        report.high_score,
        report.highest_tile,
        report.won,
        start.elapsed().as_secs_f64(),
        stats.peak_nodes,
    );
    Ok(())
}

fn suggest(cfg: &Config, hex: &str, layout: Layout) -> anyhow::Result<()> {
    let board = parse_board(hex, layout)?;
    let mut agent = Expectimax::with_config(engine::init(), cfg.search_config());
    let d = agent.decide(board);
    println!("{board}");
    match d.best {
        Some(dir) => println!("best: {dir} (depth {}, {:?})", d.depth, d.elapsed),
        None => println!("best: none, no move changes the board"),
    }
    for b in d.branches {
        if b.legal {
            println!("  {:<5} {:>14.1}", b.dir.to_string(), b.ev);
        } else {
            println!("  {:<5} {:>14}", b.dir.to_string(), "illegal");
        }
    }
    Ok(())
}

fn parse_board(s: &str, layout: Layout) -> anyhow::Result<Board> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X").replace('_', "");
    if digits.is_empty() || digits.len() > 16 {
        bail!("board must be up to 16 hex digits, got {s:?}");
    }
    let raw = u64::from_str_radix(&digits, 16).with_context(|| format!("parsing board {s:?}"))?;
    Ok(match layout {
        Layout::Grid => Board::from_raw(raw),
        Layout::LsbFirst => Board::from_lsb_first(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_argument_layouts() {
        let grid = parse_board("0x1200_0000_0000_0000", Layout::Grid).unwrap();
        assert_eq!(parse_board("0x21", Layout::LsbFirst).unwrap(), grid);
        assert_eq!(parse_board("21", Layout::Grid).unwrap(), Board::from_raw(0x21));
        assert!(parse_board("0x", Layout::Grid).is_err());
        assert!(parse_board("0x1_0000_0000_0000_0000", Layout::Grid).is_err());
        assert!(parse_board("0xzz", Layout::LsbFirst).is_err());
    }
}
