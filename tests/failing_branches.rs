use std::sync::atomic::{AtomicUsize, Ordering};

use cozy_chess::{Color, Move, Piece, Square};
use pawnstorm::eval::{Evaluator, PstEval};
use pawnstorm::mcts::{Mcts, MctsParams};
use pawnstorm::search::alphabeta::AlphaBeta;
use pawnstorm::search::{SearchBudget, SearchLimits};
use pawnstorm::{CozyPosition, Position, SearchEngine, Side};

static EVAL_FAILURES: AtomicUsize = AtomicUsize::new(0);

fn quiet_panics() {
    std::panic::set_hook(Box::new(|_| {}));
}

/// Evaluator that blows up whenever a white queen stands on h5 (first reachable via e4, Qh5).
struct QueenOnH5Fails;

impl Evaluator<CozyPosition> for QueenOnH5Fails {
    fn evaluate(&self, pos: &CozyPosition) -> i32 {
        let b = pos.board();
        if (b.pieces(Piece::Queen) & b.colors(Color::White)).has(Square::H5) {
            EVAL_FAILURES.fetch_add(1, Ordering::Relaxed);
            panic!("evaluation failure");
        }
        PstEval.evaluate(pos)
    }

    fn static_piece_value(&self, piece: Piece) -> i32 { PstEval.static_piece_value(piece) }
}

/// Board whose move generator fails for Black once White's e-pawn has left e2.
#[derive(Clone)]
struct FlakyPosition(CozyPosition);

impl FlakyPosition {
    fn broken(&self) -> bool {
        let b = self.0.board();
        self.0.side_to_move() == Side::Black && !(b.pieces(Piece::Pawn) & b.colors(Color::White)).has(Square::E2)
    }
}

impl Position for FlakyPosition {
    type Move = Move;
    type Piece = Piece;

    fn side_to_move(&self) -> Side { self.0.side_to_move() }
    fn hash(&self) -> u64 { self.0.hash() }
    fn pseudo_legal_moves(&self, out: &mut Vec<Move>) { self.legal_moves(out) }
    fn legal_moves(&self, out: &mut Vec<Move>) {
        if self.broken() { panic!("move generator failure"); }
        self.0.legal_moves(out)
    }
    fn apply_move(&mut self, mv: Move) -> bool { self.0.apply_move(mv) }
    fn undo_move(&mut self) { self.0.undo_move() }
    fn apply_null_move(&mut self) -> bool { self.0.apply_null_move() }
    fn undo_null_move(&mut self) { self.0.undo_null_move() }
    fn ply(&self) -> usize { self.0.ply() }
    fn unwind_to(&mut self, ply: usize) { self.0.unwind_to(ply) }
    fn in_check(&self) -> bool { self.0.in_check() }
    fn is_draw(&self) -> bool { self.0.is_draw() }
    fn has_non_pawn_material(&self, side: Side) -> bool { self.0.has_non_pawn_material(side) }
    fn moving_piece(&self, mv: Move) -> Option<Piece> { self.0.moving_piece(mv) }
    fn captured_piece(&self, mv: Move) -> Option<Piece> { self.0.captured_piece(mv) }
}

struct Flat;

impl Evaluator<FlakyPosition> for Flat {
    fn evaluate(&self, _pos: &FlakyPosition) -> i32 { 0 }
    fn static_piece_value(&self, _piece: Piece) -> i32 { 0 }
}

#[test]
fn alphabeta_completes_every_depth_past_failing_branch() {
    quiet_panics();
    let mut p = CozyPosition::startpos();
    let before = p.hash();
    let budget = SearchBudget::new(&SearchLimits::depth(4), p.side_to_move());
    let mut s = AlphaBeta::new(QueenOnH5Fails);
    let res = s.search(&mut p, &budget);

    assert!(EVAL_FAILURES.load(Ordering::Relaxed) > 0, "the failing branch was never reached");
    assert_eq!(res.depth, 4, "one failing branch must not end the search early");
    assert!(res.best_move.is_some());
    assert_eq!(p.hash(), before);
    assert_eq!(p.ply(), 0);

    // nodes whose children failed are not cached
    let after_qh5 = CozyPosition::with_moves(None, &["e2e4".to_string(), "e7e5".to_string(), "d1h5".to_string()]).unwrap();
    assert!(s.tt_probe(&after_qh5).is_none());
}

#[test]
fn mcts_survives_failing_move_generator() {
    quiet_panics();
    let mut p = FlakyPosition(CozyPosition::startpos());
    let before = p.hash();
    let m = Mcts::with_params(Flat, MctsParams { seed: 5, ..MctsParams::default() }).unwrap();
    let budget = SearchBudget::new(&SearchLimits::nodes(5_000), p.side_to_move());
    let root = m.build_tree(&mut p, &budget);

    assert_eq!(p.hash(), before);
    assert_eq!(p.ply(), 0);
    let e4 = root
        .children()
        .iter()
        .find(|c| c.mv().map(|mv| mv.to_string()).as_deref() == Some("e2e4"))
        .expect("e2e4 at the root");
    assert!(e4.hits() > 0, "failed iterations still count as visits");
    assert!(!e4.is_expanded());
    let sum: u64 = root.children().iter().map(|c| c.hits()).sum();
    assert_eq!(root.hits(), sum);
}
