use pawnstorm::eval::{Evaluator, MaterialEval, PstEval};
use pawnstorm::search::alphabeta::AlphaBeta;
use pawnstorm::CozyPosition;

#[test]
fn qsearch_improves_tactical_position() {
    // hanging queen vs bishop, black to move
    let mut p = CozyPosition::from_fen("4k3/8/8/8/5Q2/8/8/2b4K b - - 0 1").unwrap();
    let stand = MaterialEval.evaluate(&p);
    let mut s = AlphaBeta::new(MaterialEval);
    let qs = s.quiesce_eval(&mut p);
    assert!(qs > stand, "qsearch should improve eval: qs {qs} vs stand {stand}");
}

#[test]
fn qsearch_equals_standpat_without_captures() {
    let mut p = CozyPosition::from_fen("k7/8/8/8/8/8/8/7K w - - 0 1").unwrap();
    let stand = PstEval.evaluate(&p);
    let mut s = AlphaBeta::new(PstEval);
    assert_eq!(s.quiesce_eval(&mut p), stand);
}

#[test]
fn qsearch_sees_defended_piece() {
    // Qxd5 loses the queen to exd5: stand pat must win over the capture
    let mut p = CozyPosition::from_fen("4k3/8/4p3/3n4/8/8/3Q4/4K3 w - - 0 1").unwrap();
    let stand = MaterialEval.evaluate(&p);
    let mut s = AlphaBeta::new(MaterialEval);
    assert_eq!(s.quiesce_eval(&mut p), stand);
}
