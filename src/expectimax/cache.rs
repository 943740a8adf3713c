use std::collections::HashMap;

use ahash::RandomState;

use crate::engine::Board;

const INITIAL_CAPACITY: usize = 1 << 16;

/// Cached result of a move node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    /// Remaining depth the score was searched with.
    pub depth: u32,
    pub score: f64,
}

/// Transposition table keyed by packed board.
///
/// An entry answers a request only if it was searched at least as deep as
/// requested; shallower entries are recomputed and overwritten.
pub struct TranspositionTable {
    map: HashMap<Board, CacheEntry, RandomState>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self { map: HashMap::with_capacity_and_hasher(INITIAL_CAPACITY, RandomState::new()) }
    }

    /// Score for `board` if an entry at least `depth` deep exists.
    ///
    /// ```
    /// use tfe::engine::Board;
    /// use tfe::expectimax::TranspositionTable;
    /// let mut tt = TranspositionTable::new();
    /// tt.insert(Board::EMPTY, 2, 1.5);
    /// assert_eq!(tt.lookup(Board::EMPTY, 2), Some(1.5));
    /// assert_eq!(tt.lookup(Board::EMPTY, 3), None);
    /// ```
    #[inline]
    pub fn lookup(&self, board: Board, depth: u32) -> Option<f64> {
        self.map.get(&board).filter(|e| e.depth >= depth).map(|e| e.score)
    }

    #[inline]
    pub fn get(&self, board: Board) -> Option<CacheEntry> {
        self.map.get(&board).copied()
    }

    /// Store a result, replacing whatever was there.
    #[inline]
    pub fn insert(&mut self, board: Board, depth: u32, score: f64) {
        self.map.insert(board, CacheEntry { depth, score });
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_regardless_of_depth() {
        let mut tt = TranspositionTable::new();
        let b = Board::from_raw(0x1200_0000_0000_0000);
        tt.insert(b, 5, 10.0);
        tt.insert(b, 2, 20.0);
        assert_eq!(tt.get(b), Some(CacheEntry { depth: 2, score: 20.0 }));
        assert_eq!(tt.lookup(b, 1), Some(20.0));
        assert_eq!(tt.lookup(b, 5), None);
        assert_eq!(tt.len(), 1);
        tt.clear();
        assert!(tt.is_empty());
    }
}
