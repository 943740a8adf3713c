use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub(crate) type BoardRaw = u64;
/// A 16-bit row; column 0 is the most significant nibble.
pub type Row = u16;
/// Tile exponent (0 = empty, `e` = displayed value `2^e`).
pub type Tile = u8;
pub type Score = u64;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All directions in search order. Ties in the search resolve to the earliest entry.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Position of this direction in [`Move::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    #[inline]
    pub(crate) fn is_vertical(self) -> bool {
        matches!(self, Move::Up | Move::Down)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(s)
    }
}

/// Packed 4x4 2048 board as 16 4-bit exponents in a `u64`.
///
/// Cell `i = 4 * row + col` lives in bits `60 - 4i ..= 63 - 4i`, so the
/// top-left cell is the most significant nibble and a hex literal reads like
/// the grid: `0x1100_0000_0000_0000` is a top row of `2 2 _ _`.
///
/// Everything here is table-free. Moves and heuristics need the row tables
/// and live on [`RowTables`](super::RowTables).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Board(raw)
    }

    /// The raw packed `u64`.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Read a board packed with cell `i = 4 * row + col` in bits
    /// `4i ..= 4i + 3`, i.e. the top-left cell in the least significant
    /// nibble. This is the layout other 2048 engines commonly exchange.
    #[inline]
    pub const fn from_lsb_first(raw: u64) -> Self {
        Board(reverse_nibbles(raw))
    }

    /// Inverse of [`from_lsb_first`](Self::from_lsb_first).
    #[inline]
    pub const fn to_lsb_first(self) -> u64 {
        reverse_nibbles(self.0)
    }

    /// Build a board from four packed rows, top row first.
    #[inline]
    pub fn from_rows(rows: [Row; 4]) -> Self {
        Board(
            (rows[0] as u64) << 48 | (rows[1] as u64) << 32 | (rows[2] as u64) << 16 | rows[3] as u64,
        )
    }

    /// Build a board from a grid of exponents. Values above 15 are masked.
    ///
    /// ```
    /// use tfe::engine::Board;
    /// let b = Board::from_exponents([[1, 1, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.raw(), 0x1100_0000_0000_0000);
    /// ```
    pub fn from_exponents(grid: [[Tile; 4]; 4]) -> Self {
        let mut b = Board::EMPTY;
        for (r, row) in grid.iter().enumerate() {
            for (c, &e) in row.iter().enumerate() {
                b = b.with_tile(r, c, e);
            }
        }
        b
    }

    /// Row `idx` (0 = top) as a packed 16-bit line.
    #[inline]
    pub fn row(self, idx: usize) -> Row {
        debug_assert!(idx < 4);
        ((self.0 >> (48 - 16 * idx)) & 0xffff) as Row
    }

    /// Exponent at `(row, col)`.
    #[inline]
    pub fn tile(self, row: usize, col: usize) -> Tile {
        self.tile_at(4 * row + col)
    }

    /// Exponent at row-major index `idx` (0..16).
    #[inline]
    pub fn tile_at(self, idx: usize) -> Tile {
        debug_assert!(idx < 16);
        ((self.0 >> (60 - 4 * idx)) & 0xf) as Tile
    }

    /// Copy of this board with `(row, col)` set to exponent `e`.
    #[inline]
    pub fn with_tile(self, row: usize, col: usize, e: Tile) -> Self {
        let shift = 60 - 4 * (4 * row + col);
        Board((self.0 & !(0xf << shift)) | (((e & 0xf) as u64) << shift))
    }

    /// Displayed value at `(row, col)`: 0 when empty, else `2^e`.
    #[inline]
    pub fn tile_value(self, row: usize, col: usize) -> u32 {
        display_value(self.tile(row, col))
    }

    /// Displayed values in a 4x4 grid.
    pub fn to_grid(self) -> [[u32; 4]; 4] {
        let mut grid = [[0u32; 4]; 4];
        for (r, row) in grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.tile_value(r, c);
            }
        }
        grid
    }

    // Credit to Nneonneo
    /// Swap rows and columns. Exact involution.
    #[inline]
    pub fn transpose(self) -> Self {
        let x = self.0;
        let a1 = x & 0xF0F0_0F0F_F0F0_0F0F;
        let a2 = x & 0x0000_F0F0_0000_F0F0;
        let a3 = x & 0x0F0F_0000_0F0F_0000;
        let a = a1 | (a2 << 12) | (a3 >> 12);
        let b1 = a & 0xFF00_FF00_00FF_00FF;
        let b2 = a & 0x00FF_00FF_0000_0000;
        let b3 = a & 0x0000_0000_FF00_FF00;
        Board(b1 | (b2 >> 24) | (b3 << 24))
    }

    // https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
    /// Number of occupied cells.
    #[inline]
    pub fn count_non_empty(self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111_1111_1111_1111;
        x.count_ones()
    }

    /// Number of empty cells (0..=16).
    #[inline]
    pub fn count_empty(self) -> u32 {
        16 - self.count_non_empty()
    }

    /// Number of distinct non-zero exponents on the board.
    ///
    /// ```
    /// use tfe::engine::Board;
    /// assert_eq!(Board::from_raw(0x1120_0000_0003_0001).count_distinct_tiles(), 3);
    /// ```
    #[inline]
    pub fn count_distinct_tiles(self) -> u32 {
        let mut bitset = 0u32;
        let mut x = self.0;
        for _ in 0..16 {
            bitset |= 1 << (x & 0xf);
            x >>= 4;
        }
        // bit 0 is the empty cell
        (bitset >> 1).count_ones()
    }

    /// Largest exponent present (0 for an empty board).
    pub fn max_exponent(self) -> Tile {
        (0..16).map(|i| self.tile_at(i)).max().unwrap_or(0)
    }

    /// Highest displayed tile value, e.g. 2048.
    #[inline]
    pub fn highest_tile(self) -> u32 {
        display_value(self.max_exponent())
    }

    /// Row-major indices of empty cells, in ascending order.
    pub fn empty_cells(self) -> impl Iterator<Item = usize> {
        (0..16).filter(move |&i| self.tile_at(i) == 0)
    }

    /// Place a spawn on a uniformly chosen empty cell: exponent 1 with
    /// probability `p_two`, otherwise exponent 2.
    ///
    /// Returns the new board and the `(row, col, exponent)` placed, or `None`
    /// when the board is full.
    ///
    /// ```
    /// use tfe::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let (b, _) = Board::EMPTY.with_random_tile(&mut rng, 0.9).unwrap();
    /// assert_eq!(b.count_empty(), 15);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R, p_two: f64) -> Option<(Board, (usize, usize, Tile))> {
        let empty = self.count_empty();
        if empty == 0 {
            return None;
        }
        let nth = rng.gen_range(0..empty) as usize;
        let idx = self.empty_cells().nth(nth)?;
        let e: Tile = if rng.gen_bool(p_two) { 1 } else { 2 };
        let (r, c) = (idx / 4, idx % 4);
        Some((self.with_tile(r, c, e), (r, c, e)))
    }
}

#[inline]
const fn reverse_nibbles(x: u64) -> u64 {
    (((x & 0x0f0f_0f0f_0f0f_0f0f) << 4) | ((x >> 4) & 0x0f0f_0f0f_0f0f_0f0f)).swap_bytes()
}

/// `2^e`, or 0 for an empty cell.
#[inline]
pub fn display_value(e: Tile) -> u32 {
    if e == 0 { 0 } else { 1u32 << e }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            if r > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = (0..4).map(|c| format_val(self.tile_value(r, c))).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<u64> for Board {
    fn from(v: u64) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for u64 {
    fn from(b: Board) -> Self {
        b.raw()
    }
}

fn format_val(val: u32) -> String {
    if val == 0 { " ".repeat(7) } else { format!("{:^7}", val) }
}
