use cozy_chess::{Board, Color, Piece};

use crate::board::cozy::CozyPosition;
use crate::eval::Evaluator;

pub const PAWN: i32 = 100;
pub const KNIGHT: i32 = 320;
pub const BISHOP: i32 = 330;
pub const ROOK: i32 = 500;
pub const QUEEN: i32 = 900;
pub const KING: i32 = 20_000;

pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => KING,
    }
}

fn count_piece(board: &Board, color: Color, piece: Piece) -> i32 {
    (board.colors(color) & board.pieces(piece)).len() as i32
}

// Side-agnostic material in centipawns: positive means White has more material.
pub fn material_white(board: &Board) -> i32 {
    let mut score = 0;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        score += (count_piece(board, Color::White, piece) - count_piece(board, Color::Black, piece)) * piece_value(piece);
    }
    score
}

/// Material balance only.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialEval;

impl Evaluator<CozyPosition> for MaterialEval {
    fn evaluate(&self, pos: &CozyPosition) -> i32 {
        let board = pos.board();
        let base = material_white(board);
        if board.side_to_move() == Color::White { base } else { -base }
    }

    fn static_piece_value(&self, piece: Piece) -> i32 { piece_value(piece) }
}
