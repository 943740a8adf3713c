use std::time::Instant;

use log::debug;

use crate::agent::Agent;
use crate::engine::{Board, Move, RowTables};

use super::{BranchEval, Decision, ExpectimaxConfig, SearchStats, TranspositionTable};

/// Single-threaded Expectimax search with a persistent transposition table.
///
/// The agent never touches a live game; it only reads the `Board` value it
/// is handed.
pub struct Expectimax {
    tables: &'static RowTables,
    cfg: ExpectimaxConfig,
    cache: TranspositionTable,
    stats: SearchStats,
    nodes: u64,
    cache_hits: u64,
}

impl Expectimax {
    pub fn new(tables: &'static RowTables) -> Self {
        Self::with_config(tables, ExpectimaxConfig::default())
    }

    pub fn with_config(tables: &'static RowTables, cfg: ExpectimaxConfig) -> Self {
        Self { tables, cfg, cache: TranspositionTable::new(), stats: SearchStats::default(), nodes: 0, cache_hits: 0 }
    }

    /// Compute the best move, or `None` if no direction changes the board.
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        self.decide(board).best
    }

    /// Iteratively deepen from depth 1 up to [`target_depth`](Self::target_depth),
    /// keeping the answer of the deepest completed depth. The wall clock is
    /// checked only between depths, so one depth always runs to completion.
    ///
    /// ```
    /// use tfe::engine::{self, Board, Move};
    /// use tfe::expectimax::Expectimax;
    /// let mut ex = Expectimax::new(engine::init());
    /// let d = ex.decide(Board::from_raw(0x1100_0000_0000_0000));
    /// assert!(d.depth >= 1);
    /// assert!(!d.branches[Move::Up.index()].legal);
    /// ```
    pub fn decide(&mut self, board: Board) -> Decision {
        let start = Instant::now();
        let target = self.target_depth(board);
        let budget = self.cfg.time_budget();

        let cache_cleared = self.cache.len() > self.cfg.cache_capacity;
        if cache_cleared {
            debug!("transposition table over capacity ({} entries), clearing", self.cache.len());
            self.cache.clear();
        }
        self.nodes = 0;
        self.cache_hits = 0;

        let mut decision =
            Decision { best: None, depth: 0, branches: BranchEval::illegal_all(), elapsed: Default::default() };
        for depth in 1..=target {
            let mut branches = BranchEval::illegal_all();
            let mut best: Option<(Move, f64)> = None;
            for dir in Move::ALL {
                let moved = self.tables.shift(board, dir);
                if moved == board {
                    continue;
                }
                let ev = self.score_chance_node(moved, depth, 1.0);
                branches[dir.index()] = BranchEval { dir, ev, legal: true };
                if best.map_or(true, |(_, s)| ev > s) {
                    best = Some((dir, ev));
                }
            }
            // Legality does not depend on depth; a stuck board stays stuck.
            let Some((dir, _)) = best else { break };
            decision = Decision { best: Some(dir), depth, branches, elapsed: start.elapsed() };
            if start.elapsed() > budget {
                break;
            }
        }
        decision.elapsed = start.elapsed();

        self.stats = SearchStats {
            nodes: self.nodes,
            peak_nodes: self.stats.peak_nodes.max(self.nodes),
            cache_hits: self.cache_hits,
            target_depth: target,
            depth: decision.depth,
            cache_cleared,
            elapsed: decision.elapsed,
        };
        debug!(
            "decided {:?} at depth {}/{} in {:?} ({} nodes, {} cache hits, {} cached)",
            decision.best,
            decision.depth,
            target,
            decision.elapsed,
            self.nodes,
            self.cache_hits,
            self.cache.len()
        );
        decision
    }

    /// Depth the root aims for: more distinct tiles means a harder position
    /// and a deeper search. Never below one ply, whatever the config says.
    #[inline]
    pub fn target_depth(&self, board: Board) -> u32 {
        let wanted = board.count_distinct_tiles().saturating_sub(2).max(self.cfg.min_depth);
        wanted.min(self.cfg.max_depth).max(1)
    }

    /// Value of the player to move on `board` with `depth` move plies left
    /// and reach probability `cprob`.
    pub fn score_move_node(&mut self, board: Board, depth: u32, cprob: f32) -> f64 {
        self.nodes += 1;
        if depth == 0 || cprob < self.cfg.prob_cutoff {
            return self.tables.evaluate(board);
        }
        if let Some(score) = self.cache.lookup(board, depth) {
            self.cache_hits += 1;
            return score;
        }

        let mut best: Option<f64> = None;
        for dir in Move::ALL {
            let moved = self.tables.shift(board, dir);
            if moved != board {
                // a move and its spawn count as one ply
                let score = self.score_chance_node(moved, depth, cprob);
                best = Some(best.map_or(score, |b| b.max(score)));
            }
        }
        // Stuck: nothing to cache, the position is lost.
        let Some(best) = best else { return 0.0 };

        self.cache.insert(board, depth, best);
        best
    }

    /// Expected value over every spawn on `board`: each empty cell is equally
    /// likely, then a 2 or a 4 with the configured odds.
    pub fn score_chance_node(&mut self, board: Board, depth: u32, cprob: f32) -> f64 {
        self.nodes += 1;
        let empty = board.count_empty();
        if empty == 0 {
            return 0.0;
        }
        let p_cell = cprob / empty as f32;
        if p_cell < self.cfg.prob_cutoff {
            return self.tables.evaluate(board);
        }

        let p_two = self.cfg.spawn_two_probability;
        let p_four = 1.0 - p_two;
        let next = depth.saturating_sub(1);
        let mut total = 0.0;
        let mut tmp = board.raw();
        let mut insert_tile = 1u64;
        for _ in 0..16 {
            if tmp & 0xf == 0 {
                let two = Board::from_raw(board.raw() | insert_tile);
                let s2 = self.score_move_node(two, next, p_cell * p_two as f32);
                let four = Board::from_raw(board.raw() | (insert_tile << 1));
                let s4 = self.score_move_node(four, next, p_cell * p_four as f32);
                total += p_two * s2 + p_four * s4;
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        total / empty as f64
    }

    /// Statistics collected from the last call to [`decide`](Self::decide).
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    /// Drop every cached entry.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn config(&self) -> &ExpectimaxConfig {
        &self.cfg
    }

    pub fn cache(&self) -> &TranspositionTable {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TranspositionTable {
        &mut self.cache
    }
}

impl Agent for Expectimax {
    fn best_move(&mut self, board: Board) -> Option<Move> {
        Expectimax::best_move(self, board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    const STUCK: Board = Board::from_raw(0x1212_2121_1212_2121);
    // only Down changes this board
    const DOWN_ONLY: Board = Board::from_raw(0x1234_5678_2345_0000);

    fn agent(cfg: ExpectimaxConfig) -> Expectimax {
        Expectimax::with_config(engine::init(), cfg)
    }

    fn unbounded() -> ExpectimaxConfig {
        ExpectimaxConfig { time_budget_ms: u64::MAX, ..Default::default() }
    }

    #[test]
    fn chance_node_on_full_board_is_zero() {
        let mut ex = agent(unbounded());
        let full = Board::from_raw(0x1234_5678_9abc_def1);
        assert_eq!(ex.score_chance_node(full, 3, 1.0), 0.0);
        assert_eq!(ex.score_chance_node(STUCK, 1, 1.0), 0.0);
        assert!(ex.cache().is_empty());
    }

    #[test]
    fn move_node_leaves_use_heuristic() {
        let t = engine::init();
        let mut ex = agent(unbounded());
        let b = Board::from_raw(0x1100_0000_0000_0200);
        assert_eq!(ex.score_move_node(b, 0, 1.0), t.evaluate(b));
        assert_eq!(ex.score_move_node(b, 3, 1e-6), t.evaluate(b));
        assert!(ex.cache().is_empty());
    }

    #[test]
    fn pruned_chance_node_uses_heuristic() {
        let t = engine::init();
        let mut ex = agent(unbounded());
        let b = Board::from_raw(0x1100_0000_0000_0200);
        // 13 empty cells: 1e-3 / 13 is under the cutoff
        assert_eq!(ex.score_chance_node(b, 2, 1e-3), t.evaluate(b));
    }

    #[test]
    fn stuck_move_node_scores_zero_and_is_not_cached() {
        let mut ex = agent(unbounded());
        assert_eq!(ex.score_move_node(STUCK, 4, 1.0), 0.0);
        assert!(ex.cache().get(STUCK).is_none());
    }

    #[test]
    fn stuck_board_has_no_move_at_any_depth() {
        for depth in [1, 3, 8, 12] {
            let cfg = ExpectimaxConfig { min_depth: depth, max_depth: depth, ..unbounded() };
            let mut ex = agent(cfg);
            let d = ex.decide(STUCK);
            assert_eq!(d.best, None);
            assert_eq!(d.depth, 0);
            assert!(d.branches.iter().all(|b| !b.legal));
        }
    }

    #[test]
    fn single_legal_move_is_chosen() {
        let mut ex = agent(ExpectimaxConfig { max_depth: 3, ..unbounded() });
        let d = ex.decide(DOWN_ONLY);
        assert_eq!(d.best, Some(Move::Down));
        assert_eq!(d.depth, 3);
        let legal: Vec<Move> = d.branches.iter().filter(|b| b.legal).map(|b| b.dir).collect();
        assert_eq!(legal, vec![Move::Down]);
    }

    #[test]
    fn best_move_is_argmax_of_branches() {
        let t = engine::init();
        let mut ex = agent(unbounded());
        let b = Board::from_raw(0x2110_0310_0001_0000);
        let d = ex.decide(b);
        let best = d.best.expect("board has moves");
        for be in d.branches {
            assert_eq!(be.legal, t.shift(b, be.dir) != b);
            if be.legal {
                assert!(d.branches[best.index()].ev >= be.ev);
            }
        }
        assert_eq!(d.depth, ex.target_depth(b));
    }

    #[test]
    fn target_depth_tracks_distinct_tiles() {
        let ex = agent(ExpectimaxConfig::default());
        assert_eq!(ex.target_depth(Board::from_raw(0x1100_0000_0000_0000)), 3);
        assert_eq!(ex.target_depth(Board::from_raw(0x1234_5670_0000_0000)), 5);
        assert_eq!(ex.target_depth(Board::from_raw(0x0123_4567_89ab_cdef)), 12);
        let capped = agent(ExpectimaxConfig { max_depth: 4, ..Default::default() });
        assert_eq!(capped.target_depth(Board::from_raw(0x1234_5670_0000_0000)), 4);
    }

    #[test]
    fn zero_depth_config_still_searches_one_ply() {
        let mut ex = agent(ExpectimaxConfig { min_depth: 0, max_depth: 0, ..unbounded() });
        let b = Board::from_raw(0x1100_0000_0000_0200);
        assert_eq!(ex.target_depth(b), 1);
        let d = ex.decide(b);
        assert!(d.best.is_some());
        assert_eq!(d.depth, 1);
        assert_eq!(ex.decide(DOWN_ONLY).best, Some(Move::Down));
    }

    #[test]
    fn zero_budget_stops_after_first_depth() {
        let mut ex = agent(ExpectimaxConfig { time_budget_ms: 0, min_depth: 5, ..Default::default() });
        let d = ex.decide(Board::from_raw(0x1100_0000_0000_0200));
        assert_eq!(d.depth, 1);
        assert!(d.best.is_some());
        assert_eq!(ex.last_stats().target_depth, 5);
    }

    #[test]
    fn shallow_cache_entry_does_not_answer_deeper_request() {
        const BOGUS: f64 = -12_345.0;
        let truth = agent(unbounded()).score_move_node(DOWN_ONLY, 4, 1.0);

        let mut ex = agent(unbounded());
        ex.cache_mut().insert(DOWN_ONLY, 2, BOGUS);
        let got = ex.score_move_node(DOWN_ONLY, 4, 1.0);
        assert_ne!(got, BOGUS);
        assert_eq!(got, truth);
        assert_eq!(ex.cache().get(DOWN_ONLY).map(|e| e.depth), Some(4));

        // deep enough entries are trusted
        ex.cache_mut().insert(DOWN_ONLY, 4, BOGUS);
        assert_eq!(ex.score_move_node(DOWN_ONLY, 4, 1.0), BOGUS);
        assert_eq!(ex.score_move_node(DOWN_ONLY, 2, 1.0), BOGUS);
    }

    #[test]
    fn deeper_decision_recomputes_seeded_child() {
        const BOGUS: f64 = 1e15;
        let mut ex = agent(ExpectimaxConfig { max_depth: 4, ..unbounded() });
        // Down, then a 2 in the top-left corner
        let child = Board::from_raw(0x1000_1234_5678_2345);
        ex.cache_mut().insert(child, 2, BOGUS);
        let d = ex.decide(DOWN_ONLY);
        assert_eq!(d.depth, 4);
        assert!(d.branches[Move::Down.index()].ev < 1e9);
        assert_eq!(ex.cache().get(child).map(|e| e.depth), Some(3));
    }

    #[test]
    fn cache_persists_and_clears_over_capacity() {
        let b = Board::from_raw(0x2110_0310_0001_0000);
        let mut ex = agent(unbounded());
        ex.decide(b);
        assert!(!ex.cache().is_empty());
        assert!(!ex.last_stats().cache_cleared);
        ex.decide(b);
        assert!(ex.last_stats().cache_hits > 0);

        let mut small = agent(ExpectimaxConfig { cache_capacity: 10, ..unbounded() });
        small.decide(b);
        assert!(small.cache().len() > 10);
        small.decide(b);
        assert!(small.last_stats().cache_cleared);

        small.clear_cache();
        small.reset_stats();
        assert!(small.cache().is_empty());
        assert_eq!(small.last_stats(), SearchStats::default());
    }

    #[test]
    fn decisions_are_deterministic() {
        let b = Board::from_raw(0x3210_1100_0020_0001);
        let a = agent(unbounded()).decide(b);
        let c = agent(unbounded()).decide(b);
        assert_eq!(a.best, c.best);
        assert_eq!(a.branches, c.branches);
    }
}
