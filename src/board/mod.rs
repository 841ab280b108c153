//! Board abstraction consumed by both searches.
//!
//! The searches never look inside a board: they drive it through [`Position`]
//! with in-place make/unmake, and hand private clones to parallel workers.

use std::fmt::{Debug, Display};
use std::hash::Hash;

pub mod cozy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Mutable game state supporting make/unmake, move enumeration and draw detection.
///
/// `apply_move` may be handed a pseudo-legal move; returning `false` means the
/// move left the mover's king attacked and the position was left unchanged.
/// Every successful `apply_move` must be paired with exactly one `undo_move`.
pub trait Position: Clone + Send {
    type Move: Copy + Eq + Hash + Debug + Display + Send + Sync;
    type Piece: Copy + Eq + Debug;

    fn side_to_move(&self) -> Side;
    fn hash(&self) -> u64;

    /// Appends pseudo-legal moves to `out` (the caller clears it).
    fn pseudo_legal_moves(&self, out: &mut Vec<Self::Move>);
    fn legal_moves(&self, out: &mut Vec<Self::Move>);

    fn apply_move(&mut self, mv: Self::Move) -> bool;
    fn undo_move(&mut self);
    /// Passes the turn. Returns `false` (unchanged) when a pass is impossible, e.g. in check.
    fn apply_null_move(&mut self) -> bool;
    fn undo_null_move(&mut self);
    /// Number of moves (null moves included) applied since construction.
    fn ply(&self) -> usize;
    /// Takes back applied moves until `ply()` equals `ply`. Used to recover
    /// after a branch panicked with moves still on the board.
    fn unwind_to(&mut self, ply: usize);

    fn in_check(&self) -> bool;
    /// Repetition, fifty-move or insufficient-material draw.
    fn is_draw(&self) -> bool;
    fn has_non_pawn_material(&self, side: Side) -> bool;

    fn moving_piece(&self, mv: Self::Move) -> Option<Self::Piece>;
    fn captured_piece(&self, mv: Self::Move) -> Option<Self::Piece>;
}
