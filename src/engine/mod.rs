//! Engine module: compact 2048 board, table-driven moves and the static
//! heuristic.
//!
//! - [`Board`] is the packed 4x4 state with table-free bit operations.
//! - [`RowTables`] holds the precomputed per-row results and executes moves.
//! - [`init`] builds the tables once per process; games and agents take the
//!   returned reference, so the tables always exist before they do.

mod heuristic;
mod ops;
pub mod state;
mod tables;

pub use state::{display_value, Board, Move, Row, Score, Tile};
pub use tables::{RowEntry, RowTables};

/// Build the row tables on first call and return them. Safe to call from
/// anywhere, any number of times.
///
/// ```
/// let a = tfe::engine::init();
/// let b = tfe::engine::init();
/// assert!(std::ptr::eq(a, b));
/// ```
pub fn init() -> &'static RowTables {
    tables::init()
}
