//! Expectimax search policy for 2048.
//!
//! [`Expectimax`] alternates a maximizing move ply with an expectation ply
//! over random spawns. Branches whose reach probability drops below a cutoff
//! fall back to the static heuristic; move-node results are memoized in a
//! [`TranspositionTable`] that persists across decisions. The root deepens
//! iteratively and stops once a completed depth overruns the time budget.
//!
//! Quick start
//! ```
//! use tfe::engine::{self, Board};
//! use tfe::expectimax::Expectimax;
//!
//! let tables = engine::init();
//! let mut ex = Expectimax::new(tables);
//! let b = Board::from_raw(0x1100_0000_0000_0200);
//! assert!(ex.best_move(b).is_some());
//!
//! // A stuck board has no move.
//! assert_eq!(ex.best_move(Board::from_raw(0x1212_2121_1212_2121)), None);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::Move;

mod cache;
mod search;

pub use cache::{CacheEntry, TranspositionTable};
pub use search::Expectimax;

/// Knobs for the search. Defaults match the tuned values of the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    /// Prune when the probability of reaching a node falls below this.
    pub prob_cutoff: f32,
    /// Lower bound on the dynamic target depth.
    pub min_depth: u32,
    /// Hard cap on the dynamic target depth.
    pub max_depth: u32,
    /// Stop deepening once a completed depth has taken longer than this.
    pub time_budget_ms: u64,
    /// Clear the transposition table before a decision if it holds more entries.
    pub cache_capacity: usize,
    /// Probability that a spawn is a 2. Follows the game's setting.
    #[serde(skip)]
    pub spawn_two_probability: f64,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            prob_cutoff: 1e-4,
            min_depth: 3,
            max_depth: 12,
            time_budget_ms: 200,
            cache_capacity: 500_000,
            spawn_two_probability: 0.9,
        }
    }
}

impl ExpectimaxConfig {
    #[inline]
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

/// Expected value of one root branch at the deepest completed depth.
///
/// `legal` is false when the move is a no-op for the board; `ev` is then 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

impl BranchEval {
    pub(crate) fn illegal_all() -> [BranchEval; 4] {
        Move::ALL.map(|dir| BranchEval { dir, ev: 0.0, legal: false })
    }
}

/// Result of one root decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Chosen move; `None` when no direction changes the board.
    pub best: Option<Move>,
    /// Deepest fully completed depth (0 when there was no move).
    pub depth: u32,
    /// Per-direction values at `depth`, in `Up, Down, Left, Right` order.
    pub branches: [BranchEval; 4],
    pub elapsed: Duration,
}

/// Counters from the most recent decision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    /// Nodes (move + chance) visited by the last decision.
    pub nodes: u64,
    /// Most nodes visited by any decision so far.
    pub peak_nodes: u64,
    pub cache_hits: u64,
    /// Depth the last decision aimed for.
    pub target_depth: u32,
    /// Depth the last decision completed.
    pub depth: u32,
    /// Whether the table was over capacity and got cleared first.
    pub cache_cleared: bool,
    pub elapsed: Duration,
}
