use std::cell::RefCell;

/// Callbacks pushed by a [`Game`](super::Game).
///
/// All methods default to no-ops, so an observer implements only what it
/// cares about. Methods take `&self`; observers that record state use
/// interior mutability.
///
/// `on_tile_move` and `on_tile_merge` are part of the contract for
/// renderers that animate individual tiles, but the table-driven move path
/// works on whole rows and does not emit them.
pub trait GameObserver {
    fn on_game_reset(&self) {}
    fn on_game_over(&self) {}
    /// A tile with displayed `value` appeared at `(row, col)`.
    fn on_tile_spawn(&self, _row: usize, _col: usize, _value: u32) {}
    fn on_tile_move(&self, _from_row: usize, _from_col: usize, _to_row: usize, _to_col: usize, _value: u32) {}
    fn on_tile_merge(&self, _row: usize, _col: usize, _value: u32) {}
}

/// Handle returned by [`Game::add_observer`](super::Game::add_observer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Event as delivered to a [`GameObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Reset,
    GameOver,
    Spawn { row: usize, col: usize, value: u32 },
    Move { from_row: usize, from_col: usize, to_row: usize, to_col: usize, value: u32 },
    Merge { row: usize, col: usize, value: u32 },
}

/// Records every event in delivery order.
///
/// ```
/// use tfe::engine;
/// use tfe::game::{EventLog, Game, GameConfig, GameEvent};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let log = EventLog::default();
/// let mut game = Game::with_rng(engine::init(), GameConfig::default(), StdRng::seed_from_u64(1));
/// game.add_observer(&log);
/// game.reset();
/// let events = log.take();
/// assert_eq!(events[0], GameEvent::Reset);
/// assert_eq!(events.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<GameEvent>>,
}

impl EventLog {
    /// Drain the recorded events.
    pub fn take(&self) -> Vec<GameEvent> {
        self.events.take()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, e: GameEvent) {
        self.events.borrow_mut().push(e);
    }
}

impl GameObserver for EventLog {
    fn on_game_reset(&self) {
        self.push(GameEvent::Reset);
    }
    fn on_game_over(&self) {
        self.push(GameEvent::GameOver);
    }
    fn on_tile_spawn(&self, row: usize, col: usize, value: u32) {
        self.push(GameEvent::Spawn { row, col, value });
    }
    fn on_tile_move(&self, from_row: usize, from_col: usize, to_row: usize, to_col: usize, value: u32) {
        self.push(GameEvent::Move { from_row, from_col, to_row, to_col, value });
    }
    fn on_tile_merge(&self, row: usize, col: usize, value: u32) {
        self.push(GameEvent::Merge { row, col, value });
    }
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl GameObserver for LogObserver {
    fn on_game_reset(&self) {
        log::debug!("game reset");
    }
    fn on_game_over(&self) {
        log::debug!("game over");
    }
    fn on_tile_spawn(&self, row: usize, col: usize, value: u32) {
        log::debug!("spawned {value} at ({row}, {col})");
    }
}
