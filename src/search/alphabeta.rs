use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::eval::{is_mate_score, Evaluator, DRAW_SCORE, INFINITY, MATE_SCORE, MAX_PLY};
use crate::search::budget::SearchBudget;
use crate::search::pv::PvTable;
use crate::search::tt::{score_from_tt, score_to_tt, Bound, Entry, TranspositionTable};
use crate::search::{format_line, Score, SearchEngine, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaParams {
    pub tt_entries: usize,
    pub use_nullmove: bool,
    /// Null-move child depth is `depth - null_reduction`.
    pub null_reduction: u32,
    pub use_pvs: bool,
    pub check_extension: bool,
}

impl Default for AlphaBetaParams {
    fn default() -> Self {
        Self { tt_entries: 1 << 20, use_nullmove: true, null_reduction: 3, use_pvs: true, check_extension: true }
    }
}

/// Single-threaded iterative-deepening negamax over an in-place position.
pub struct AlphaBeta<P: Position, E> {
    params: AlphaBetaParams,
    eval: E,
    tt: TranspositionTable<P::Move>,
    pv: PvTable<P::Move>,
    // (move, score) from the last pass at the root, in search order
    root_scores: Vec<(P::Move, i32)>,
    root_best: Option<(P::Move, i32)>,
    search_moves: Vec<String>,
}

impl<P: Position, E: Evaluator<P>> AlphaBeta<P, E> {
    pub fn new(eval: E) -> Self { Self::with_params(eval, AlphaBetaParams::default()) }

    pub fn with_params(eval: E, params: AlphaBetaParams) -> Self {
        Self {
            params,
            eval,
            tt: TranspositionTable::with_entries(params.tt_entries),
            pv: PvTable::default(),
            root_scores: Vec::new(),
            root_best: None,
            search_moves: Vec::new(),
        }
    }

    pub fn params(&self) -> &AlphaBetaParams { &self.params }

    pub fn tt(&self) -> &TranspositionTable<P::Move> { &self.tt }

    pub fn tt_probe(&self, pos: &P) -> Option<Entry<P::Move>> { self.tt.get(pos.hash()) }

    /// Quiescence score of `pos` with a full window, side-to-move perspective.
    pub fn quiesce_eval(&mut self, pos: &mut P) -> i32 {
        let budget = SearchBudget::unlimited();
        self.quiesce(pos, &budget, -INFINITY, INFINITY, 0)
    }

    fn order_moves(&self, pos: &P, moves: &mut [P::Move], hash_move: Option<P::Move>) {
        // stable: equal keys keep generation order
        moves.sort_by_cached_key(|&m| {
            if Some(m) == hash_move { return -MATE_SCORE; }
            match pos.captured_piece(m) {
                Some(victim) => {
                    let attacker = pos.moving_piece(m).map_or(0, |p| self.eval.static_piece_value(p));
                    -(self.eval.static_piece_value(victim) - attacker)
                }
                None => 0,
            }
        });
    }

    // root_scores is sorted best-first after each completed pass
    fn order_root(&self, moves: &mut [P::Move]) {
        moves.sort_by_cached_key(|&m| {
            self.root_scores.iter().position(|(rm, _)| *rm == m).unwrap_or(usize::MAX)
        });
    }

    fn filter_root(&self, moves: &mut Vec<P::Move>) {
        if self.search_moves.is_empty() { return; }
        let wanted: Vec<P::Move> = moves.iter().copied()
            .filter(|m| self.search_moves.iter().any(|s| *s == m.to_string()))
            .collect();
        // a filter naming no playable move is ignored
        if !wanted.is_empty() { *moves = wanted; }
    }

    /// Runs one child search, turning a panic inside it into `None` with the
    /// position taken back to the ply it had on entry.
    fn guarded<F>(&mut self, pos: &mut P, ply: usize, child: F) -> Option<i32>
    where
        F: FnOnce(&mut Self, &mut P) -> i32,
    {
        let entry_ply = pos.ply();
        match catch_unwind(AssertUnwindSafe(|| child(self, pos))) {
            Ok(score) => Some(score),
            Err(_) => {
                warn!("branch at ply {ply} panicked; scoring it as a draw");
                pos.unwind_to(entry_ply);
                self.pv.clear(ply + 1);
                None
            }
        }
    }

    fn quiesce(&mut self, pos: &mut P, budget: &SearchBudget, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if budget.is_exhausted() { return 0; }
        budget.count_node();
        if ply >= MAX_PLY { return self.eval.evaluate(pos); }

        let in_check = pos.in_check();
        let mut best = -INFINITY;
        if !in_check {
            let stand = self.eval.evaluate(pos);
            if stand >= beta { return stand; }
            if stand > alpha { alpha = stand; }
            best = stand;
        }

        let mut moves = Vec::with_capacity(32);
        pos.pseudo_legal_moves(&mut moves);
        if !in_check { moves.retain(|&m| pos.captured_piece(m).is_some()); }
        self.order_moves(pos, &mut moves, None);

        let mut legal = 0;
        for mv in moves {
            if !pos.apply_move(mv) { continue; }
            legal += 1;
            let score = self
                .guarded(pos, ply, |s, pos| -s.quiesce(pos, budget, -beta, -alpha, ply + 1))
                .unwrap_or(DRAW_SCORE);
            pos.undo_move();
            if budget.is_stopped() { return 0; }
            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                    if score >= beta { return score; }
                }
            }
        }
        if in_check && legal == 0 { return -MATE_SCORE + ply as i32; }
        best
    }

    fn negamax(&mut self, pos: &mut P, budget: &SearchBudget, mut alpha: i32, mut beta: i32, depth: i32, ply: usize) -> i32 {
        self.pv.clear(ply);
        if budget.is_exhausted() { return 0; }
        if depth <= 0 || ply >= MAX_PLY { return self.quiesce(pos, budget, alpha, beta, ply); }
        budget.count_node();

        let root = ply == 0;
        if !root && pos.is_draw() { return DRAW_SCORE; }

        let key = pos.hash();
        let mut hash_move = None;
        if let Some(e) = self.tt.get(key) {
            hash_move = e.best;
            if !root && e.depth >= depth as u32 {
                let s = score_from_tt(e.score, ply);
                match e.bound {
                    Bound::Exact => return s,
                    Bound::Lower => alpha = alpha.max(s),
                    Bound::Upper => beta = beta.min(s),
                }
                if alpha >= beta { return s; }
            }
        }

        let in_check = pos.in_check();
        let side = pos.side_to_move();
        if self.params.use_nullmove
            && !root
            && !in_check
            && depth > 1
            && !is_mate_score(beta)
            && pos.has_non_pawn_material(side)
            && self.eval.evaluate(pos) >= beta
            && pos.apply_null_move()
        {
            let reduced = depth - self.params.null_reduction as i32;
            let score = -self.negamax(pos, budget, -beta, -beta + 1, reduced, ply + 1);
            pos.undo_null_move();
            if budget.is_stopped() { return 0; }
            if score >= beta {
                // an unverified mate from a pass is not trusted
                let s = if is_mate_score(score) { beta } else { score };
                self.tt.put(key, depth as u32, score_to_tt(s, ply), None, Bound::Lower);
                return s;
            }
        }

        let mut moves = Vec::with_capacity(64);
        pos.pseudo_legal_moves(&mut moves);
        if root {
            self.filter_root(&mut moves);
            if self.root_scores.is_empty() {
                self.order_moves(pos, &mut moves, hash_move);
            } else {
                self.order_root(&mut moves);
            }
            self.root_scores.clear();
        } else {
            self.order_moves(pos, &mut moves, hash_move);
        }

        let child_depth = if in_check && self.params.check_extension { depth } else { depth - 1 };
        let orig_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;
        let mut legal = 0;
        // a panicked child makes this node's score unfit for the table
        let mut tainted = false;
        for mv in moves {
            if !pos.apply_move(mv) { continue; }
            legal += 1;
            let full_window = legal == 1 || !self.params.use_pvs;
            let searched = self.guarded(pos, ply, |s, pos| {
                if full_window {
                    return -s.negamax(pos, budget, -beta, -alpha, child_depth, ply + 1);
                }
                let v = -s.negamax(pos, budget, -alpha - 1, -alpha, child_depth, ply + 1);
                if v > alpha && v < beta {
                    -s.negamax(pos, budget, -beta, -alpha, child_depth, ply + 1)
                } else {
                    v
                }
            });
            let score = searched.unwrap_or_else(|| {
                tainted = true;
                DRAW_SCORE
            });
            pos.undo_move();
            if budget.is_stopped() { return 0; }

            if root { self.root_scores.push((mv, score)); }
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                    self.pv.update(ply, mv);
                    if root { self.root_best = Some((mv, score)); }
                    if score >= beta {
                        if !tainted {
                            self.tt.put(key, depth as u32, score_to_tt(score, ply), Some(mv), Bound::Lower);
                        }
                        return score;
                    }
                }
            }
        }

        if legal == 0 {
            return if in_check { -MATE_SCORE + ply as i32 } else { DRAW_SCORE };
        }
        if tainted || (root && !self.search_moves.is_empty()) { return best_score; }
        let bound = if best_score <= orig_alpha { Bound::Upper } else { Bound::Exact };
        let stored_move = if bound == Bound::Exact { best_move } else { None };
        self.tt.put(key, depth as u32, score_to_tt(best_score, ply), stored_move, bound);
        best_score
    }

    fn first_legal(pos: &mut P) -> Option<P::Move> {
        let mut moves = Vec::with_capacity(64);
        pos.legal_moves(&mut moves);
        moves.into_iter().next()
    }

    pub fn search_position(&mut self, pos: &mut P, budget: &SearchBudget) -> SearchResult<P::Move> {
        self.tt.bump_generation();
        self.root_scores.clear();
        self.root_best = None;
        self.search_moves = budget.search_moves().to_vec();
        let hash_before = pos.hash();

        let mut completed: Option<(P::Move, i32, Vec<P::Move>, u32)> = None;
        let mut no_moves_score = None;
        for depth in 1..=budget.max_depth().min(MAX_PLY as u32) {
            self.root_best = None;
            let backup = pos.clone();
            let pass = catch_unwind(AssertUnwindSafe(|| {
                self.negamax(pos, budget, -INFINITY, INFINITY, depth as i32, 0)
            }));
            let score = match pass {
                Ok(s) => s,
                Err(_) => {
                    // only reachable when the root itself fails; branches recover in place
                    warn!("search pass at depth {depth} panicked; keeping depth {}", depth - 1);
                    *pos = backup;
                    break;
                }
            };
            if budget.is_stopped() {
                debug!("depth {depth} interrupted after {} nodes", budget.nodes());
                break;
            }
            // stable: the previous best stays ahead of equal scores
            self.root_scores.sort_by_key(|&(_, s)| -s);
            match self.root_best {
                Some((mv, _)) => {
                    let mut line = self.pv.line(0).to_vec();
                    if line.first() != Some(&mv) { line = vec![mv]; }
                    let elapsed = budget.elapsed();
                    info!(
                        "depth {} score {} time {} nodes {} nps {} pv {}",
                        depth,
                        Score::Centipawns(score),
                        elapsed.as_millis(),
                        budget.nodes(),
                        nps(budget.nodes(), elapsed),
                        format_line(&line)
                    );
                    completed = Some((mv, score, line, depth));
                }
                None => {
                    // no legal move at the root: mate or stalemate
                    no_moves_score = Some(score);
                    break;
                }
            }
            if is_mate_score(score) && depth as i32 >= MATE_SCORE - score.abs() { break; }
            if budget.is_exhausted() { break; }
        }

        if pos.hash() != hash_before {
            error!("position hash changed during search: {hash_before:#x} -> {:#x}", pos.hash());
        }

        let elapsed = budget.elapsed();
        let nodes = budget.nodes();
        match completed {
            Some((mv, score, pv, depth)) => SearchResult {
                best_move: Some(mv),
                score: Score::Centipawns(score),
                pv,
                depth,
                nodes,
                elapsed,
            },
            None => {
                let fallback = self.root_best.map(|(m, _)| m).or_else(|| {
                    if no_moves_score.is_some() { None } else { Self::first_legal(pos) }
                });
                SearchResult {
                    best_move: fallback,
                    score: Score::Centipawns(no_moves_score.or(self.root_best.map(|(_, s)| s)).unwrap_or(0)),
                    pv: fallback.into_iter().collect(),
                    depth: 0,
                    nodes,
                    elapsed,
                }
            }
        }
    }
}

impl<P: Position, E: Evaluator<P>> SearchEngine<P> for AlphaBeta<P, E> {
    fn search(&mut self, pos: &mut P, budget: &SearchBudget) -> SearchResult<P::Move> {
        self.search_position(pos, budget)
    }
}

fn nps(nodes: u64, elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis().max(1) as u64;
    nodes.saturating_mul(1000) / ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::cozy::CozyPosition;
    use crate::eval::MaterialEval;

    fn ordered(fen: &str, hash: Option<&str>) -> Vec<String> {
        let pos = CozyPosition::from_fen(fen).unwrap();
        let s: AlphaBeta<CozyPosition, MaterialEval> = AlphaBeta::with_params(MaterialEval, AlphaBetaParams { tt_entries: 16, ..AlphaBetaParams::default() });
        let mut moves = Vec::new();
        pos.pseudo_legal_moves(&mut moves);
        let hash_move = hash.and_then(|h| pos.find_move(h));
        s.order_moves(&pos, &mut moves, hash_move);
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn most_valuable_victim_first() {
        // the d4 pawn can take the queen or the knight
        let moves = ordered("4k3/8/8/2q1n3/3P4/8/8/4KR2 w - - 0 1", None);
        assert_eq!(moves[0], "d4c5");
        assert_eq!(moves[1], "d4e5");
    }

    #[test]
    fn hash_move_before_captures() {
        let moves = ordered("4k3/8/8/2q1n3/3P4/8/8/4KR2 w - - 0 1", Some("f1f2"));
        assert_eq!(moves[0], "f1f2");
        assert_eq!(moves[1], "d4c5");
    }

    #[test]
    fn pv_starts_with_best_move() {
        let mut pos = CozyPosition::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut s: AlphaBeta<CozyPosition, MaterialEval> = AlphaBeta::new(MaterialEval);
        let budget = SearchBudget::new(&crate::search::SearchLimits::depth(2), pos.side_to_move());
        let res = s.search_position(&mut pos, &budget);
        assert_eq!(res.pv.first(), res.best_move.as_ref());
    }
}
