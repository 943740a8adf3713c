//! Autoplay: an [`Agent`] driving a [`Game`], with results kept in a
//! [`ScoreStore`].
//!
//! ```
//! use tfe::engine;
//! use tfe::expectimax::{Expectimax, ExpectimaxConfig};
//! use tfe::game::{Game, GameConfig};
//! use tfe::persistence::MemoryStore;
//! use tfe::session::{Limits, Outcome, Session};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let tables = engine::init();
//! let game = Game::with_rng(tables, GameConfig::default(), StdRng::seed_from_u64(3));
//! let agent = Expectimax::with_config(tables, ExpectimaxConfig { max_depth: 2, ..Default::default() });
//! let mut session = Session::new(game, agent, MemoryStore::new());
//! let report = session.run(&Limits { max_moves: Some(20), ..Default::default() }).unwrap();
//! assert_eq!(report.moves, 20);
//! assert_eq!(report.outcome, Outcome::MaxMoves);
//! ```

use log::{info, warn};
use rand::{rngs::StdRng, Rng};

use crate::agent::Agent;
use crate::engine::{display_value, Move, Score};
use crate::game::Game;
use crate::persistence::{ScoreStore, StoreError};

/// What one [`Session::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(Move),
    /// The agent had nothing that changes the board.
    NoMove,
    GameOver,
}

/// Why [`Session::run`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    GameOver,
    NoMove,
    MaxMoves,
    StopScore,
    StopTile,
}

/// Early stopping conditions for [`Session::run`]. `None` disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_moves: Option<u64>,
    pub stop_score: Option<Score>,
    /// Displayed tile value, e.g. 2048.
    pub stop_tile: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Moves applied during this run.
    pub moves: u64,
    pub score: Score,
    pub high_score: Score,
    pub highest_tile: u32,
    pub won: bool,
    pub outcome: Outcome,
}

pub struct Session<'o, A: Agent, S: ScoreStore, R: Rng = StdRng> {
    game: Game<'o, R>,
    agent: A,
    store: S,
    moves: u64,
    recorded: bool,
}

impl<'o, A: Agent, S: ScoreStore, R: Rng> Session<'o, A, S, R> {
    /// Wrap `game`, seeding its high score from `store`. A store that cannot
    /// be read counts as 0.
    pub fn new(game: Game<'o, R>, agent: A, store: S) -> Self {
        let high_score = store.load_high_score().unwrap_or_else(|e| {
            warn!("could not load high score, starting from 0: {e}");
            0
        });
        Self { game: game.with_high_score(high_score), agent, store, moves: 0, recorded: false }
    }

    /// Play one move. On game over the finished game is recorded in the
    /// store, once, and any suspended snapshot is dropped.
    pub fn step(&mut self) -> Result<Step, StoreError> {
        if self.game.is_game_over() {
            if !self.recorded {
                // a failed write leaves the game unrecorded so the next step retries
                self.store.record_game(self.game.score(), self.game.has_won())?;
                self.recorded = true;
                self.store.clear_state()?;
            }
            return Ok(Step::GameOver);
        }
        let Some(dir) = self.agent.best_move(self.game.board()) else { return Ok(Step::NoMove) };
        if !self.game.make_move(dir) {
            return Ok(Step::NoMove);
        }
        self.moves += 1;
        Ok(Step::Moved(dir))
    }

    /// Step until the game ends, the agent gives up, or a limit is hit.
    pub fn run(&mut self, limits: &Limits) -> Result<Report, StoreError> {
        self.run_with(limits, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_move` after every applied move.
    pub fn run_with(
        &mut self,
        limits: &Limits,
        mut on_move: impl FnMut(Move, &Game<'o, R>),
    ) -> Result<Report, StoreError> {
        info!("session start: score {}, high score {}", self.game.score(), self.game.high_score());
        let start_moves = self.moves;
        let outcome = loop {
            if let Some(o) = self.limit_hit(limits, self.moves - start_moves) {
                break o;
            }
            match self.step()? {
                Step::Moved(dir) => on_move(dir, &self.game),
                Step::NoMove => break Outcome::NoMove,
                Step::GameOver => break Outcome::GameOver,
            }
        };
        let report = Report {
            moves: self.moves - start_moves,
            score: self.game.score(),
            high_score: self.game.high_score(),
            highest_tile: self.game.board().highest_tile(),
            won: self.game.has_won(),
            outcome,
        };
        info!(
            "session end ({:?}): {} moves, score {}, highest tile {}",
            report.outcome, report.moves, report.score, report.highest_tile
        );
        Ok(report)
    }

    fn limit_hit(&self, limits: &Limits, moves: u64) -> Option<Outcome> {
        if limits.max_moves.is_some_and(|m| moves >= m) {
            return Some(Outcome::MaxMoves);
        }
        if limits.stop_score.is_some_and(|s| self.game.score() >= s) {
            return Some(Outcome::StopScore);
        }
        if limits.stop_tile.is_some_and(|t| display_value(self.game.board().max_exponent()) >= t) {
            return Some(Outcome::StopTile);
        }
        None
    }

    /// Save the current position so a later session can [`resume`](Self::resume).
    pub fn suspend(&mut self) -> Result<(), StoreError> {
        self.store.save_state(&self.game.state())
    }

    /// Restore the saved position, if any. Returns whether one was loaded.
    /// An unreadable store is logged and the current game continues.
    pub fn resume(&mut self) -> bool {
        match self.store.load_state() {
            Ok(Some(state)) => {
                self.game.load_state(state);
                self.recorded = false;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("could not load saved game, starting fresh: {e}");
                false
            }
        }
    }

    /// Start a fresh game. The high score carries over.
    pub fn new_game(&mut self) -> Result<(), StoreError> {
        self.game.reset();
        self.recorded = false;
        self.store.clear_state()
    }

    pub fn game(&self) -> &Game<'o, R> {
        &self.game
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Moves applied over the session's lifetime.
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn into_parts(self) -> (Game<'o, R>, A, S) {
        (self.game, self.agent, self.store)
    }
}
