use cozy_chess::{Board, Color, Piece, Square};

use crate::board::cozy::CozyPosition;
use crate::eval::material::{material_white, piece_value};
use crate::eval::Evaluator;

// Tables are written rank 8 first, from White's point of view.
#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_OPENING_PST: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_END_PST: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

const PHASE_MOVES: i32 = 40;

#[inline]
fn table_index(color: Color, sq: Square) -> usize {
    let idx = sq as usize;
    // a1 is 0; flip ranks for White so row 0 of the table is its eighth rank
    match color { Color::White => idx ^ 56, Color::Black => idx }
}

fn table_for(piece: Piece) -> Option<&'static [i32; 64]> {
    match piece {
        Piece::Pawn => Some(&PAWN_PST),
        Piece::Knight => Some(&KNIGHT_PST),
        Piece::Bishop => Some(&BISHOP_PST),
        Piece::Rook => Some(&ROOK_PST),
        Piece::Queen => Some(&QUEEN_PST),
        Piece::King => None,
    }
}

fn side_pst(board: &Board, color: Color, phase: i32) -> i32 {
    let mut sum = 0;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        if let Some(table) = table_for(piece) {
            for sq in board.colors(color) & board.pieces(piece) {
                sum += table[table_index(color, sq)];
            }
        }
    }
    for sq in board.colors(color) & board.pieces(Piece::King) {
        let i = table_index(color, sq);
        sum += ((PHASE_MOVES - phase) * KING_OPENING_PST[i] + phase * KING_END_PST[i]) / PHASE_MOVES;
    }
    sum
}

/// Material plus piece-square tables; the king table fades from opening to endgame over 40 moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct PstEval;

impl PstEval {
    pub fn score_white(board: &Board) -> i32 {
        let phase = (board.fullmove_number() as i32).min(PHASE_MOVES);
        material_white(board) + side_pst(board, Color::White, phase) - side_pst(board, Color::Black, phase)
    }
}

impl Evaluator<CozyPosition> for PstEval {
    fn evaluate(&self, pos: &CozyPosition) -> i32 {
        let board = pos.board();
        let s = Self::score_white(board);
        if board.side_to_move() == Color::White { s } else { -s }
    }

    fn static_piece_value(&self, piece: Piece) -> i32 { piece_value(piece) }
}
