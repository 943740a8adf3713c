use super::state::{Board, Move, Score};
use super::tables::RowTables;

impl RowTables {
    /// Slide/merge tiles in `dir`. Returns the new board and the points
    /// gained. No randomness; never spawns.
    ///
    /// ```
    /// use tfe::engine::{self, Board, Move};
    /// let t = engine::init();
    /// let b = Board::from_raw(0x1100_0000_0000_0000);
    /// assert_eq!(t.execute_move(b, Move::Left), (Board::from_raw(0x2000_0000_0000_0000), 4));
    /// assert_eq!(t.execute_move(b, Move::Right).0, Board::from_raw(0x0002_0000_0000_0000));
    /// ```
    #[inline]
    pub fn execute_move(&self, board: Board, dir: Move) -> (Board, Score) {
        let src = if dir.is_vertical() { board.transpose() } else { board };
        let table: &[u16] = match dir {
            Move::Left | Move::Up => &self.left,
            Move::Right | Move::Down => &self.right,
        };
        let mut rows = [0u16; 4];
        let mut gained: Score = 0;
        for (idx, slot) in rows.iter_mut().enumerate() {
            let row = src.row(idx) as usize;
            *slot = table[row];
            gained += self.score[row] as Score;
        }
        let moved = Board::from_rows(rows);
        let moved = if dir.is_vertical() { moved.transpose() } else { moved };
        (moved, gained)
    }

    /// Board-only form of [`execute_move`](Self::execute_move).
    #[inline]
    pub fn shift(&self, board: Board, dir: Move) -> Board {
        self.execute_move(board, dir).0
    }

    /// True if some direction changes the board.
    pub fn has_legal_move(&self, board: Board) -> bool {
        Move::ALL.iter().any(|&dir| self.shift(board, dir) != board)
    }

    /// Static heuristic value: the row heuristic summed over the 4 rows and
    /// the 4 columns.
    #[inline]
    pub fn evaluate(&self, board: Board) -> f64 {
        let cols = board.transpose();
        (0..4).fold(0., |acc, idx| {
            acc + self.heuristic[board.row(idx) as usize] + self.heuristic[cols.row(idx) as usize]
        })
    }
}
