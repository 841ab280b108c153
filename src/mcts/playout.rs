use std::panic::{catch_unwind, AssertUnwindSafe};

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::eval::Evaluator;
use crate::search::budget::SearchBudget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playout {
    /// Uniformly random legal moves to the end or the ply cap
    Random,
    /// Random moves, stopping once the static eval is decisive
    MaterialCutoff,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayoutParams {
    pub kind: Playout,
    pub max_plies: u32,
    pub decisive_margin_cp: i32,
    pub win_prob_scale: f64,
}

/// Maps a centipawn score to an outcome in (-1, 1) through a logistic win probability.
pub fn cp_to_outcome(cp: i32, scale: f64) -> f64 {
    let p = 1.0 / (1.0 + (-(cp as f64) / scale).exp());
    2.0 * p - 1.0
}

/// Plays out from `pos` and returns the outcome for its side to move.
///
/// The position is restored before returning, also when the playout panics;
/// a panicking playout scores 0.
pub fn simulate<P, E, R>(pos: &mut P, eval: &E, params: &PlayoutParams, rng: &mut R, budget: &SearchBudget) -> f64
where
    P: Position,
    E: Evaluator<P>,
    R: Rng,
{
    let mut applied = 0u32;
    let res = catch_unwind(AssertUnwindSafe(|| playout(pos, eval, params, rng, budget, &mut applied)));
    for _ in 0..applied { pos.undo_move(); }
    match res {
        Ok(outcome) => if applied % 2 == 1 { -outcome } else { outcome },
        Err(_) => {
            warn!("playout panicked after {applied} plies; scoring branch as 0");
            0.0
        }
    }
}

// Outcome is for the side to move at the final position
fn playout<P, E, R>(pos: &mut P, eval: &E, params: &PlayoutParams, rng: &mut R, budget: &SearchBudget, applied: &mut u32) -> f64
where
    P: Position,
    E: Evaluator<P>,
    R: Rng,
{
    let mut moves = Vec::with_capacity(64);
    loop {
        moves.clear();
        pos.legal_moves(&mut moves);
        if moves.is_empty() {
            return if pos.in_check() { -1.0 } else { 0.0 };
        }
        if pos.is_draw() { return 0.0; }
        let cutoff = params.kind == Playout::MaterialCutoff;
        if cutoff {
            let cp = eval.evaluate(pos);
            if cp.abs() >= params.decisive_margin_cp { return cp_to_outcome(cp, params.win_prob_scale); }
        }
        if *applied >= params.max_plies {
            return if cutoff { cp_to_outcome(eval.evaluate(pos), params.win_prob_scale) } else { 0.0 };
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        if pos.apply_move(mv) {
            *applied += 1;
            budget.count_node();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_symmetric_and_bounded() {
        assert_eq!(cp_to_outcome(0, 400.0), 0.0);
        let up = cp_to_outcome(800, 400.0);
        assert!(up > 0.7 && up < 1.0, "{up}");
        assert!((up + cp_to_outcome(-800, 400.0)).abs() < 1e-12);
    }
}
