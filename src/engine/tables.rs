use std::sync::OnceLock;

use super::heuristic::line_heuristic;
use super::state::{Row, Score, Tile};

/// Precomputed results for all 2^16 possible rows.
///
/// Sliding a row and scoring it depends only on its 4 nibbles, so every
/// full-board move or evaluation is 4 (or 8) table lookups. Built once by
/// [`init`](super::init) and never mutated afterwards.
///
/// Layout:
/// - `left[i]` / `right[i]`: row `i` after sliding toward column 0 / column 3.
/// - `score[i]`: points gained by the merges of that slide (same both ways).
/// - `heuristic[i]`: row-local heuristic contribution.
pub struct RowTables {
    pub(crate) left: Box<[Row]>,
    pub(crate) right: Box<[Row]>,
    pub(crate) score: Box<[u32]>,
    pub(crate) heuristic: Box<[f64]>,
}

/// One row's slice of the tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowEntry {
    pub left: Row,
    pub right: Row,
    pub score: Score,
    pub heuristic: f64,
}

pub(crate) const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

static TABLES: OnceLock<RowTables> = OnceLock::new();

pub(crate) fn init() -> &'static RowTables {
    TABLES.get_or_init(RowTables::build)
}

impl RowTables {
    /// Build every table from scratch. Prefer [`init`](super::init), which
    /// does this at most once per process.
    pub fn build() -> Self {
        // Allocate on the heap to keep stack frames small during init.
        let mut left = vec![0 as Row; LINE_TABLE_SIZE];
        let mut right = vec![0 as Row; LINE_TABLE_SIZE];
        let mut score = vec![0u32; LINE_TABLE_SIZE];
        let mut heuristic = vec![0f64; LINE_TABLE_SIZE];

        for val in 0..LINE_TABLE_SIZE {
            let row = val as Row;
            let tiles = unpack(row);
            let (slid, gained) = slide_left(tiles);
            left[val] = pack(slid);
            score[val] = gained;
            heuristic[val] = line_heuristic(&tiles);

            let (slid_rev, _) = slide_left(reversed(tiles));
            right[val] = pack(reversed(slid_rev));
        }

        RowTables {
            left: left.into_boxed_slice(),
            right: right.into_boxed_slice(),
            score: score.into_boxed_slice(),
            heuristic: heuristic.into_boxed_slice(),
        }
    }

    /// Every precomputed value for `row`.
    ///
    /// ```
    /// let t = tfe::engine::init();
    /// let e = t.entry(0x1100);
    /// assert_eq!((e.left, e.right, e.score), (0x2000, 0x0002, 4));
    /// ```
    #[inline]
    pub fn entry(&self, row: Row) -> RowEntry {
        let i = row as usize;
        RowEntry {
            left: self.left[i],
            right: self.right[i],
            score: self.score[i] as Score,
            heuristic: self.heuristic[i],
        }
    }
}

#[inline]
fn unpack(row: Row) -> [Tile; 4] {
    [(row >> 12) as Tile & 0xf, (row >> 8) as Tile & 0xf, (row >> 4) as Tile & 0xf, row as Tile & 0xf]
}

#[inline]
fn pack(tiles: [Tile; 4]) -> Row {
    (tiles[0] as Row) << 12 | (tiles[1] as Row) << 8 | (tiles[2] as Row) << 4 | tiles[3] as Row
}

#[inline]
fn reversed(t: [Tile; 4]) -> [Tile; 4] {
    [t[3], t[2], t[1], t[0]]
}

/// Compact toward index 0, merging each pair of equal neighbours once.
///
/// Exponent 15 is the largest a nibble holds, so two 32768 tiles do not merge.
fn slide_left(tiles: [Tile; 4]) -> ([Tile; 4], u32) {
    let mut out = [0 as Tile; 4];
    let mut len = 0;
    let mut score = 0u32;
    let mut pending: Option<Tile> = None;
    for t in tiles.into_iter().filter(|&t| t != 0) {
        match pending {
            Some(p) if p == t && t < 15 => {
                out[len] = t + 1;
                score += 1 << (t + 1);
                len += 1;
                pending = None;
            }
            Some(p) => {
                out[len] = p;
                len += 1;
                pending = Some(t);
            }
            None => pending = Some(t),
        }
    }
    if let Some(p) = pending {
        out[len] = p;
    }
    (out, score)
}
