//! Live game state: one packed board plus score bookkeeping, random spawns
//! and observer notifications.
//!
//! ```
//! use tfe::engine::{self, Move};
//! use tfe::game::{Game, GameConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut game = Game::with_rng(engine::init(), GameConfig::default(), StdRng::seed_from_u64(42));
//! assert_eq!(game.board().count_non_empty(), 2);
//! for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
//!     game.make_move(dir);
//! }
//! assert!(game.high_score() >= game.score());
//! ```

mod observer;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::{display_value, Board, Move, RowTables, Score, Tile};

pub use observer::{EventLog, GameEvent, GameObserver, LogObserver, ObserverId};

/// Immutable `(board, score)` snapshot for save/restore and for handing a
/// position to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub score: Score,
}

/// Rules that vary between games.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Probability that a spawn is a 2 (exponent 1); otherwise a 4.
    pub spawn_two_probability: f64,
    /// Exponent that counts as a win (11 = 2048).
    pub win_exponent: Tile,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { spawn_two_probability: 0.9, win_exponent: 11 }
    }
}

/// A running game.
///
/// Observers are borrowed for `'o`; the game never owns them, and the borrow
/// checker keeps each one alive for as long as it is registered.
pub struct Game<'o, R: Rng = StdRng> {
    tables: &'static RowTables,
    cfg: GameConfig,
    board: Board,
    score: Score,
    high_score: Score,
    won: bool,
    rng: R,
    observers: Vec<(ObserverId, &'o dyn GameObserver)>,
    next_observer: u64,
}

impl<'o> Game<'o, StdRng> {
    /// New game seeded from OS entropy.
    pub fn new(tables: &'static RowTables, cfg: GameConfig) -> Self {
        Self::with_rng(tables, cfg, StdRng::from_entropy())
    }
}

impl<'o, R: Rng> Game<'o, R> {
    /// New game with two random tiles drawn from `rng`.
    pub fn with_rng(tables: &'static RowTables, cfg: GameConfig, rng: R) -> Self {
        let mut game = Self {
            tables,
            cfg,
            board: Board::EMPTY,
            score: 0,
            high_score: 0,
            won: false,
            rng,
            observers: Vec::new(),
            next_observer: 0,
        };
        game.reset();
        game
    }

    /// Seed the high score, e.g. from a [`ScoreStore`](crate::persistence::ScoreStore).
    pub fn with_high_score(mut self, high_score: Score) -> Self {
        self.high_score = self.high_score.max(high_score);
        self
    }

    /// Clear the board and score, notify observers, then spawn two tiles.
    /// The high score is kept.
    pub fn reset(&mut self) {
        self.board = Board::EMPTY;
        self.score = 0;
        self.won = false;
        self.notify(|o| o.on_game_reset());
        self.spawn_random_tile();
        self.spawn_random_tile();
    }

    /// Slide in `dir`. If the board changed, bank the points and spawn a
    /// tile. Returns whether the board changed; a no-op move has no side
    /// effects at all.
    pub fn make_move(&mut self, dir: Move) -> bool {
        let (moved, gained) = self.tables.execute_move(self.board, dir);
        if moved == self.board {
            return false;
        }
        self.board = moved;
        self.score += gained;
        self.high_score = self.high_score.max(self.score);
        if moved.max_exponent() >= self.cfg.win_exponent {
            self.won = true;
        }
        self.spawn_random_tile();
        true
    }

    /// Place a 2 or 4 on a uniformly chosen empty cell. No-op on a full board.
    pub fn spawn_random_tile(&mut self) {
        let spawned = self.board.with_random_tile(&mut self.rng, self.cfg.spawn_two_probability);
        if let Some((next, (row, col, e))) = spawned {
            self.board = next;
            let value = display_value(e);
            self.notify(|o| o.on_tile_spawn(row, col, value));
        }
    }

    /// True if no direction changes the board. Notifies observers when it is.
    pub fn is_game_over(&self) -> bool {
        if self.tables.has_legal_move(self.board) {
            return false;
        }
        self.notify(|o| o.on_game_over());
        true
    }

    /// Displayed values, for renderers.
    pub fn grid(&self) -> [[u32; 4]; 4] {
        self.board.to_grid()
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn high_score(&self) -> Score {
        self.high_score
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn state(&self) -> GameState {
        GameState { board: self.board, score: self.score }
    }

    /// Restore a snapshot. Observers see a reset.
    pub fn load_state(&mut self, state: GameState) {
        self.board = state.board;
        self.score = state.score;
        self.high_score = self.high_score.max(state.score);
        self.won = state.board.max_exponent() >= self.cfg.win_exponent;
        self.notify(|o| o.on_game_reset());
    }

    /// Register `observer`; it is notified after every earlier registration.
    pub fn add_observer(&mut self, observer: &'o dyn GameObserver) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Deregister. Returns false if `id` was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&self, f: impl Fn(&dyn GameObserver)) {
        for (_, o) in &self.observers {
            f(*o);
        }
    }
}
