//! tfe: a 2048 bitboard engine + Expectimax agent
//!
//! This crate provides:
//! - A packed `Board` (16 four-bit exponents in a `u64`) and table-driven moves (`engine`)
//! - A live `Game` with random spawns, score bookkeeping and observers (`game`)
//! - A time-budgeted Expectimax search with a transposition table (`expectimax`)
//! - Autoplay sessions with high-score persistence (`session`, `persistence`)
//!
//! Quick start:
//! ```
//! use tfe::engine::{self, Move};
//! use tfe::expectimax::Expectimax;
//! use tfe::game::{Game, GameConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // One-time table init
//! let tables = engine::init();
//!
//! let mut game = Game::with_rng(tables, GameConfig::default(), StdRng::seed_from_u64(42));
//! let mut ai = Expectimax::new(tables);
//! for _ in 0..5 {
//!     let dir: Move = ai.best_move(game.board()).expect("fresh game has moves");
//!     assert!(game.make_move(dir));
//! }
//! assert!(game.score() <= game.high_score());
//! ```
pub mod agent;
pub mod config;
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod persistence;
pub mod session;
