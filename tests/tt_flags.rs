use pawnstorm::eval::PstEval;
use pawnstorm::search::alphabeta::{AlphaBeta, AlphaBetaParams};
use pawnstorm::search::tt::{score_from_tt, Bound, TranspositionTable};
use pawnstorm::search::{SearchBudget, SearchLimits};
use pawnstorm::{CozyPosition, Position, Score, SearchEngine};

#[test]
fn tt_exact_after_search() {
    let mut p = CozyPosition::startpos();
    let mut s = AlphaBeta::new(PstEval);
    let budget = SearchBudget::new(&SearchLimits::depth(3), p.side_to_move());
    let res = s.search(&mut p, &budget);
    let e = s.tt_probe(&p).expect("tt entry missing");
    assert_eq!(e.bound, Bound::Exact, "expected exact bound after full-window search");
    assert!(e.depth >= 3, "expected stored depth >= 3, got {}", e.depth);
    assert_eq!(e.best, res.best_move);
}

#[test]
fn new_generation_overwrites_root_entry() {
    let mut p = CozyPosition::startpos();
    let mut s = AlphaBeta::new(PstEval);
    let budget = SearchBudget::new(&SearchLimits::depth(4), p.side_to_move());
    s.search(&mut p, &budget);
    let d1 = s.tt_probe(&p).unwrap().depth;
    let budget = SearchBudget::new(&SearchLimits::depth(1), p.side_to_move());
    s.search(&mut p, &budget);
    let d2 = s.tt_probe(&p).unwrap().depth;
    assert_eq!(d1, 4);
    assert_eq!(d2, 1, "a fresh search should refresh the root entry");
    assert!(!s.tt().is_empty());
}

#[test]
fn tt_capacity_is_bounded() {
    let params = AlphaBetaParams { tt_entries: 64, ..AlphaBetaParams::default() };
    let mut p = CozyPosition::startpos();
    let mut s = AlphaBeta::with_params(PstEval, params);
    let budget = SearchBudget::new(&SearchLimits::depth(3), p.side_to_move());
    s.search(&mut p, &budget);
    assert_eq!(s.tt().capacity(), 64);
    assert!(s.tt().len() <= 64, "tt grew past capacity: {}", s.tt().len());
}

#[test]
fn tt_capacity_mb_and_clear() {
    let mut tt: TranspositionTable<u32> = TranspositionTable::with_entries(4);
    tt.set_capacity_mb(1);
    assert!(tt.capacity() > 1000);
    for k in 0..100u64 { tt.put(k, 1, 0, None, Bound::Exact); }
    assert!(!tt.is_empty());
    tt.clear();
    assert!(tt.is_empty());
}

#[test]
fn stale_generation_evicted_before_deep_entry() {
    // one bucket of four slots
    let mut tt: TranspositionTable<u32> = TranspositionTable::with_entries(4);
    tt.put(1, 1, 0, None, Bound::Exact);
    tt.bump_generation();
    for k in 2..=4u64 { tt.put(k, 10, 0, None, Bound::Exact); }
    tt.put(5, 2, 0, None, Bound::Exact);
    assert!(tt.get(1).is_none(), "stale entry should be the victim");
    assert!(tt.get(5).is_some());
    // same generation: shallowest goes
    tt.put(6, 3, 0, None, Bound::Exact);
    assert!(tt.get(5).is_none());
    assert!(tt.get(6).is_some());
    assert_eq!(tt.generation(), 1);
}

// Exact fixed-depth search: no null move, no extensions, so every node's depth is root depth minus ply.
fn exact_params() -> AlphaBetaParams {
    AlphaBetaParams { use_nullmove: false, check_extension: false, ..AlphaBetaParams::default() }
}

fn full_window_score(pos: &CozyPosition, depth: u32) -> i32 {
    let mut p = pos.clone();
    let mut s = AlphaBeta::with_params(PstEval, exact_params());
    let budget = SearchBudget::new(&SearchLimits::depth(depth), p.side_to_move());
    match s.search(&mut p, &budget).score {
        Score::Centipawns(cp) => cp,
        other => panic!("unexpected score {other:?}"),
    }
}

#[test]
fn stored_bounds_hold_against_full_window_search() {
    let fens = [
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3",
        // white threatens Ra8 mate, so child entries carry mate scores
        "6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1",
    ];
    let mut checked = 0;
    for fen in fens {
        let mut p = CozyPosition::from_fen(fen).unwrap();
        let mut s = AlphaBeta::with_params(PstEval, exact_params());
        let budget = SearchBudget::new(&SearchLimits::depth(3), p.side_to_move());
        s.search(&mut p, &budget);

        let mut moves = Vec::new();
        p.legal_moves(&mut moves);
        for mv in moves {
            assert!(p.apply_move(mv));
            if let Some(e) = s.tt_probe(&p) {
                let stored = score_from_tt(e.score, 0);
                let truth = full_window_score(&p, e.depth);
                match e.bound {
                    Bound::Exact => assert_eq!(stored, truth, "exact entry after {mv} in {fen}"),
                    Bound::Lower => assert!(stored <= truth, "lower bound {stored} above {truth} after {mv} in {fen}"),
                    Bound::Upper => assert!(stored >= truth, "upper bound {stored} below {truth} after {mv} in {fen}"),
                }
                checked += 1;
            }
            p.undo_move();
        }
    }
    assert!(checked > 0, "no child entries to check");
}
