//! The seam between a game driver and whatever picks its moves.

use crate::engine::{Board, Move};

/// Move policy. Returns `None` when no direction changes `board`.
///
/// ```
/// use tfe::agent::Agent;
/// use tfe::engine::{self, Board, Move};
/// use tfe::expectimax::Expectimax;
///
/// fn first_legal(agent: &mut dyn Agent, b: Board) -> Option<Move> {
///     agent.best_move(b)
/// }
/// let mut ex = Expectimax::new(engine::init());
/// assert!(first_legal(&mut ex, Board::from_raw(0x1100_0000_0000_0000)).is_some());
/// ```
pub trait Agent {
    fn best_move(&mut self, board: Board) -> Option<Move>;
}

impl<A: Agent + ?Sized> Agent for &mut A {
    fn best_move(&mut self, board: Board) -> Option<Move> {
        (**self).best_move(board)
    }
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn best_move(&mut self, board: Board) -> Option<Move> {
        (**self).best_move(board)
    }
}
