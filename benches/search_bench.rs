use criterion::{criterion_group, criterion_main, Criterion, black_box};
use pawnstorm::eval::PstEval;
use pawnstorm::search::alphabeta::{AlphaBeta, AlphaBetaParams};
use pawnstorm::search::{SearchBudget, SearchLimits};
use pawnstorm::{CozyPosition, Position, SearchEngine};

fn bench_search(c: &mut Criterion) {
    let start = CozyPosition::startpos();
    // each run starts cold; a small table keeps allocation out of the timing
    let params = AlphaBetaParams { tt_entries: 1 << 16, ..AlphaBetaParams::default() };
    c.bench_function("search_depth_4_startpos", |ben| {
        ben.iter(|| {
            let mut p = start.clone();
            let mut s: AlphaBeta<CozyPosition, PstEval> = AlphaBeta::with_params(PstEval, params);
            let budget = SearchBudget::new(&SearchLimits::depth(4), p.side_to_move());
            let r = s.search(black_box(&mut p), &budget);
            black_box(r.nodes)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
