use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Square};

use crate::board::{Position, Side};
use crate::error::EngineError;

/// [`Position`] over a cozy-chess board.
///
/// cozy-chess is copy-make, so unmake pops the previous board off a stack.
/// Its generator only yields legal moves, which makes the pseudo-legal list
/// identical to the legal one.
#[derive(Clone, Debug)]
pub struct CozyPosition {
    board: CozyBoard,
    undo: Vec<CozyBoard>,
    hashes: Vec<u64>,
}

impl Default for CozyPosition {
    fn default() -> Self { Self::startpos() }
}

impl CozyPosition {
    pub fn startpos() -> Self {
        Self::from_board(CozyBoard::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        CozyBoard::from_fen(fen, false)
            .map(Self::from_board)
            .map_err(|e| EngineError::Fen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn from_board(board: CozyBoard) -> Self {
        let hashes = vec![board.hash()];
        Self { board, undo: Vec::with_capacity(128), hashes }
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    /// Looks up a legal move by UCI text. Castling is accepted both as
    /// king-takes-rook (`e1h1`) and in standard form (`e1g1`).
    pub fn find_move(&self, mv_uci: &str) -> Option<Move> {
        let mut found = None;
        self.board.generate_moves(|moves| {
            for m in moves {
                if format!("{}", m) == mv_uci || self.standard_castle_text(m).as_deref() == Some(mv_uci) {
                    found = Some(m);
                    break;
                }
            }
            found.is_some()
        });
        found
    }

    fn standard_castle_text(&self, m: Move) -> Option<String> {
        let us = self.board.colors(self.board.side_to_move());
        if self.board.piece_on(m.from) != Some(Piece::King) || !us.has(m.to) { return None; }
        let file = if m.to.file() > m.from.file() { File::G } else { File::C };
        Some(format!("{}{}", m.from, Square::new(file, m.from.rank())))
    }

    /// Plays a setup move given in UCI text; it stays in the repetition history.
    pub fn play_uci(&mut self, mv_uci: &str) -> Result<(), EngineError> {
        let m = self.find_move(mv_uci).ok_or_else(|| EngineError::IllegalMove(mv_uci.to_string()))?;
        self.board.play_unchecked(m);
        self.hashes.push(self.board.hash());
        Ok(())
    }

    pub fn with_moves(fen: Option<&str>, moves: &[String]) -> Result<Self, EngineError> {
        let mut pos = match fen { Some(f) => Self::from_fen(f)?, None => Self::startpos() };
        for m in moves { pos.play_uci(m)?; }
        Ok(pos)
    }

    fn is_repetition(&self) -> bool {
        let n = self.hashes.len();
        let window = (self.board.halfmove_clock() as usize).min(n - 1);
        let current = self.hashes[n - 1];
        let mut repeats = 0;
        let mut back = 2;
        while back <= window {
            if self.hashes[n - 1 - back] == current {
                repeats += 1;
                if repeats >= 2 { return true; }
            }
            back += 2;
        }
        false
    }

    fn is_insufficient_material(&self) -> bool {
        let b = &self.board;
        let heavy = b.pieces(Piece::Pawn) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        if !heavy.is_empty() { return false; }
        let minors = b.pieces(Piece::Knight) | b.pieces(Piece::Bishop);
        minors.len() <= 1
    }

    fn push(&mut self, next: CozyBoard) {
        let prev = std::mem::replace(&mut self.board, next);
        self.undo.push(prev);
        self.hashes.push(self.board.hash());
    }

    fn pop(&mut self) {
        if let Some(prev) = self.undo.pop() {
            self.board = prev;
            self.hashes.pop();
        }
    }
}

fn to_side(color: Color) -> Side {
    match color { Color::White => Side::White, Color::Black => Side::Black }
}

fn to_color(side: Side) -> Color {
    match side { Side::White => Color::White, Side::Black => Color::Black }
}

impl Position for CozyPosition {
    type Move = Move;
    type Piece = Piece;

    fn side_to_move(&self) -> Side { to_side(self.board.side_to_move()) }

    fn hash(&self) -> u64 { self.board.hash() }

    fn pseudo_legal_moves(&self, out: &mut Vec<Move>) { self.legal_moves(out) }

    fn legal_moves(&self, out: &mut Vec<Move>) {
        self.board.generate_moves(|moves| { out.extend(moves); false });
    }

    fn apply_move(&mut self, mv: Move) -> bool {
        if !self.board.is_legal(mv) { return false; }
        let mut next = self.board.clone();
        next.play_unchecked(mv);
        self.push(next);
        true
    }

    fn undo_move(&mut self) { self.pop() }

    fn apply_null_move(&mut self) -> bool {
        match self.board.null_move() {
            Some(next) => { self.push(next); true }
            None => false,
        }
    }

    fn undo_null_move(&mut self) { self.pop() }

    fn ply(&self) -> usize { self.undo.len() }

    fn unwind_to(&mut self, ply: usize) {
        while self.undo.len() > ply { self.pop(); }
    }

    fn in_check(&self) -> bool { !self.board.checkers().is_empty() }

    fn is_draw(&self) -> bool {
        self.board.halfmove_clock() >= 100 || self.is_insufficient_material() || self.is_repetition()
    }

    fn has_non_pawn_material(&self, side: Side) -> bool {
        let b = &self.board;
        let officers = b.pieces(Piece::Knight) | b.pieces(Piece::Bishop) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        !(b.colors(to_color(side)) & officers).is_empty()
    }

    fn moving_piece(&self, mv: Move) -> Option<Piece> { self.board.piece_on(mv.from) }

    fn captured_piece(&self, mv: Move) -> Option<Piece> {
        let them = !self.board.side_to_move();
        if self.board.colors(them).has(mv.to) { return self.board.piece_on(mv.to); }
        // en passant: a pawn changing file onto an empty square
        if self.board.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file() {
            return Some(Piece::Pawn);
        }
        None
    }
}
