//! Static evaluation contract and score scale shared by both searches.

use crate::board::Position;

pub mod material;
pub mod pst;

pub use material::MaterialEval;
pub use pst::PstEval;

// Mate scoring helpers
pub const MATE_SCORE: i32 = 30_000;
pub const INFINITY: i32 = 32_000;
pub const DRAW_SCORE: i32 = 0;
pub const MAX_PLY: usize = 100;

/// True for scores that encode a forced mate (either side).
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE - MAX_PLY as i32
}

/// Pluggable position scoring. Scores are centipawns from the side to move's point of view.
pub trait Evaluator<P: Position>: Send + Sync {
    fn evaluate(&self, pos: &P) -> i32;
    /// Value used for capture ordering; not necessarily the evaluation's material value.
    fn static_piece_value(&self, piece: P::Piece) -> i32;
}
