//! Multi-threaded Monte-Carlo tree search.
//!
//! Workers share one tree and each drive a private clone of the position.
//! Statistics are atomic; expansion is publish-once per node.

pub mod node;
pub mod playout;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::search::budget::SearchBudget;
use crate::search::{format_line, Score, SearchEngine, SearchResult};

pub use node::Node;
pub use playout::{cp_to_outcome, Playout, PlayoutParams};

const LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsParams {
    pub threads: usize,
    pub exploration: f64,
    pub seed: u64,
    pub playout: Playout,
    pub max_playout_plies: u32,
    pub decisive_margin_cp: i32,
    pub win_prob_scale: f64,
}

impl Default for MctsParams {
    fn default() -> Self {
        Self {
            threads: 1,
            exploration: 1.47,
            seed: 0,
            playout: Playout::Random,
            max_playout_plies: 200,
            decisive_margin_cp: 400,
            win_prob_scale: 400.0,
        }
    }
}

impl MctsParams {
    fn playout_params(&self) -> PlayoutParams {
        PlayoutParams {
            kind: self.playout,
            max_plies: self.max_playout_plies,
            decisive_margin_cp: self.decisive_margin_cp,
            win_prob_scale: self.win_prob_scale,
        }
    }
}

pub struct Mcts<E> {
    params: MctsParams,
    eval: E,
    pool: rayon::ThreadPool,
}

impl<E> Mcts<E> {
    pub fn new(eval: E) -> Result<Self, EngineError> { Self::with_params(eval, MctsParams::default()) }

    pub fn with_params(eval: E, params: MctsParams) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads.max(1))
            .thread_name(|i| format!("mcts-worker-{i}"))
            .build()?;
        Ok(Self { params, eval, pool })
    }

    pub fn params(&self) -> &MctsParams { &self.params }

    /// Runs the search to budget exhaustion and returns the finished tree.
    ///
    /// The root is expanded up front, restricted to the budget's search moves
    /// when any of them is legal. A root without moves comes back terminal.
    pub fn build_tree<P>(&self, pos: &mut P, budget: &SearchBudget) -> Node<P::Move>
    where
        P: Position,
        E: Evaluator<P>,
    {
        let root = Node::root(pos.side_to_move());
        let mut moves = Vec::with_capacity(64);
        pos.legal_moves(&mut moves);
        if moves.is_empty() {
            root.set_terminal(if pos.in_check() { -1.0 } else { 0.0 });
            return root;
        }
        let filter = budget.search_moves();
        if !filter.is_empty() {
            let wanted: Vec<P::Move> = moves.iter().copied().filter(|m| filter.iter().any(|s| *s == m.to_string())).collect();
            if !wanted.is_empty() { moves = wanted; }
        }
        root.expand(&moves);

        let threads = self.params.threads.max(1);
        let boards: Vec<P> = (0..threads).map(|_| pos.clone()).collect();
        let root_ref = &root;
        self.pool.install(|| {
            boards.into_par_iter().enumerate().for_each(|(i, mut board)| {
                let mut rng = SmallRng::seed_from_u64(self.params.seed.wrapping_add(i as u64));
                self.worker(i, root_ref, &mut board, &mut rng, budget);
            });
        });
        root
    }

    fn worker<P>(&self, index: usize, root: &Node<P::Move>, pos: &mut P, rng: &mut SmallRng, budget: &SearchBudget)
    where
        P: Position,
        E: Evaluator<P>,
    {
        let sim = self.params.playout_params();
        let mut last_log = Instant::now();
        while !budget.is_exhausted() {
            self.iterate(root, pos, rng, budget, &sim);
            if index == 0 && last_log.elapsed() >= LOG_INTERVAL {
                info!("mcts nodes {} time {} root visits {}", budget.nodes(), budget.elapsed().as_millis(), root.hits());
                last_log = Instant::now();
            }
        }
    }

    // One select/expand/simulate/backpropagate pass
    fn iterate<'t, P>(
        &self,
        root: &'t Node<P::Move>,
        pos: &mut P,
        rng: &mut SmallRng,
        budget: &SearchBudget,
        sim: &PlayoutParams,
    ) where
        P: Position,
        E: Evaluator<P>,
    {
        let base = pos.ply();
        let mut path: Vec<&'t Node<P::Move>> = vec![root];
        let outcome = catch_unwind(AssertUnwindSafe(|| self.select_and_simulate(&mut path, pos, rng, budget, sim)));
        // value is for the side to move at the last node on the path
        let mut value = match outcome {
            Ok(v) => v,
            Err(_) => {
                warn!("mcts iteration panicked {} plies below the root; scoring it as 0", path.len() - 1);
                0.0
            }
        };
        for n in path.iter().rev() {
            n.record(-value);
            value = -value;
        }
        pos.unwind_to(base);
    }

    fn select_and_simulate<'t, P>(
        &self,
        path: &mut Vec<&'t Node<P::Move>>,
        pos: &mut P,
        rng: &mut SmallRng,
        budget: &SearchBudget,
        sim: &PlayoutParams,
    ) -> f64
    where
        P: Position,
        E: Evaluator<P>,
    {
        let c = self.params.exploration;
        let mut node = path[path.len() - 1];
        loop {
            budget.count_node();
            if node.is_terminal() { return node.terminal_result(); }
            if let Some(child) = node.select(c, rng) {
                if !Self::descend(pos, child) { return 0.0; }
                path.push(child);
                node = child;
                continue;
            }

            let mut moves = Vec::with_capacity(64);
            pos.legal_moves(&mut moves);
            if moves.is_empty() {
                let result = if pos.in_check() { -1.0 } else { 0.0 };
                node.set_terminal(result);
                return result;
            }
            if path.len() > 1 && pos.is_draw() {
                node.set_terminal(0.0);
                return 0.0;
            }
            node.expand(&moves);
            return match node.select(c, rng) {
                Some(child) if Self::descend(pos, child) => {
                    path.push(child);
                    playout::simulate(pos, &self.eval, sim, rng, budget)
                }
                _ => 0.0,
            };
        }
    }

    fn descend<P: Position>(pos: &mut P, child: &Node<P::Move>) -> bool {
        match child.mv() {
            Some(m) => pos.apply_move(m),
            None => false,
        }
    }
}

impl<P, E> SearchEngine<P> for Mcts<E>
where
    P: Position,
    E: Evaluator<P>,
{
    fn search(&mut self, pos: &mut P, budget: &SearchBudget) -> SearchResult<P::Move> {
        let hash_before = pos.hash();
        let root = self.build_tree(pos, budget);
        if pos.hash() != hash_before {
            error!("position hash changed during search: {hash_before:#x} -> {:#x}", pos.hash());
        }

        let elapsed = budget.elapsed();
        let nodes = budget.nodes();
        if root.is_terminal() {
            return SearchResult {
                best_move: None,
                score: Score::WinRate(root.terminal_result()),
                pv: Vec::new(),
                depth: 0,
                nodes,
                elapsed,
            };
        }

        debug!("root children:\n{}", root.statistics_string(10));
        let best = root.best_child();
        let pv = root.principal_line();
        let score = best.map_or(0.0, |b| b.mean_score());
        info!(
            "mcts score {} time {} nodes {} visits {} pv {}",
            Score::WinRate(score),
            elapsed.as_millis(),
            nodes,
            root.hits(),
            format_line(&pv)
        );
        SearchResult {
            best_move: best.and_then(|b| b.mv()),
            score: Score::WinRate(score),
            depth: pv.len() as u32,
            pv,
            nodes,
            elapsed,
        }
    }
}
