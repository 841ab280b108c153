use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;

use rand::Rng;

use crate::board::Side;

pub const EPS: f64 = 1e-6;
const MILLI: f64 = 1000.0;

/// A node in the search tree.
///
/// Statistics are kept from the point of view of the player who made `mv`,
/// so a parent ranks its children by their own win rates. Children are
/// published once; racing expanders all observe the first set.
pub struct Node<M> {
    mv: Option<M>,
    side: Side,
    hits: AtomicU64,
    wins: AtomicU64,
    losses: AtomicU64,
    // sum of outcomes in thousandths
    score: AtomicI64,
    children: OnceLock<Box<[Node<M>]>>,
    terminal: AtomicBool,
    terminal_result: AtomicI64,
}

impl<M: Copy> Node<M> {
    /// Synthetic root for the position with `side` to move.
    pub fn root(side: Side) -> Self { Self::new(None, side) }

    pub fn new(mv: Option<M>, side: Side) -> Self {
        Self {
            mv,
            side,
            hits: AtomicU64::new(0),
            wins: AtomicU64::new(0),
            losses: AtomicU64::new(0),
            score: AtomicI64::new(0),
            children: OnceLock::new(),
            terminal: AtomicBool::new(false),
            terminal_result: AtomicI64::new(0),
        }
    }

    pub fn mv(&self) -> Option<M> { self.mv }

    /// Side to move in this node's position
    pub fn side(&self) -> Side { self.side }

    pub fn hits(&self) -> u64 { self.hits.load(Ordering::Relaxed) }
    pub fn wins(&self) -> u64 { self.wins.load(Ordering::Relaxed) }
    pub fn losses(&self) -> u64 { self.losses.load(Ordering::Relaxed) }

    pub fn accumulated_score(&self) -> f64 { self.score.load(Ordering::Relaxed) as f64 / MILLI }

    /// Mean outcome in [-1, 1], 0 when unvisited
    pub fn mean_score(&self) -> f64 {
        let h = self.hits();
        if h == 0 { 0.0 } else { self.accumulated_score() / h as f64 }
    }

    pub fn win_rate(&self) -> f64 { self.wins() as f64 / (self.hits() as f64 + EPS) }

    /// Ratio used for the final move choice
    pub fn final_ratio(&self) -> f64 { self.wins() as f64 / (self.hits() as f64 + 1.0) }

    pub fn children(&self) -> &[Node<M>] {
        self.children.get().map(|c| &c[..]).unwrap_or(&[])
    }

    pub fn is_expanded(&self) -> bool { self.children.get().is_some() }

    /// Publishes one child per move unless another thread got there first.
    pub fn expand(&self, moves: &[M]) -> &[Node<M>] {
        let side = self.side.flip();
        self.children.get_or_init(|| moves.iter().map(|&m| Node::new(Some(m), side)).collect())
    }

    pub fn is_terminal(&self) -> bool { self.terminal.load(Ordering::Acquire) }

    /// Cached outcome for the side to move, valid once `is_terminal` is true
    pub fn terminal_result(&self) -> f64 { self.terminal_result.load(Ordering::Relaxed) as f64 / MILLI }

    pub fn set_terminal(&self, result: f64) {
        self.terminal_result.store((result * MILLI).round() as i64, Ordering::Relaxed);
        self.terminal.store(true, Ordering::Release);
    }

    /// Adds one visit with `value` seen by the player who moved into this node.
    pub fn record(&self, value: f64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if value > 0.0 {
            self.wins.fetch_add(1, Ordering::Relaxed);
        } else if value < 0.0 {
            self.losses.fetch_add(1, Ordering::Relaxed);
        }
        self.score.fetch_add((value * MILLI).round() as i64, Ordering::Relaxed);
    }

    pub fn ucb1(&self, parent_hits: u64, exploration: f64, jitter: f64) -> f64 {
        let h = self.hits() as f64 + EPS;
        self.win_rate() + exploration * (((parent_hits + 1) as f64).ln() / h).sqrt() + EPS * jitter
    }

    /// Child maximising UCB1; `None` for a leaf.
    pub fn select<R: Rng>(&self, exploration: f64, rng: &mut R) -> Option<&Node<M>> {
        let parent_hits = self.hits();
        let mut best: Option<(&Node<M>, f64)> = None;
        for child in self.children() {
            let u = child.ucb1(parent_hits, exploration, rng.gen::<f64>());
            if best.map_or(true, |(_, b)| u > b) { best = Some((child, u)); }
        }
        best.map(|(c, _)| c)
    }

    /// Child with the highest `wins / (hits + 1)`; exploration plays no part.
    pub fn best_child(&self) -> Option<&Node<M>> {
        let mut best: Option<&Node<M>> = None;
        for child in self.children() {
            if best.map_or(true, |b| child.final_ratio() > b.final_ratio()) { best = Some(child); }
        }
        best
    }

    /// Follows best children while they have been visited
    pub fn principal_line(&self) -> Vec<M> {
        let mut line = Vec::new();
        let mut node = self;
        while let Some(child) = node.best_child() {
            if child.hits() == 0 { break; }
            if let Some(m) = child.mv { line.push(m); }
            node = child;
        }
        line
    }
}

impl<M: Copy + std::fmt::Display> Node<M> {
    /// Table of the most visited children for debugging
    pub fn statistics_string(&self, rows: usize) -> String {
        let mut s = String::from("|   move   |   hits   |   wins   |  losses  |   mean   |\n");
        let mut sorted: Vec<&Node<M>> = self.children().iter().collect();
        sorted.sort_by_key(|c| std::cmp::Reverse(c.hits()));
        for child in sorted.into_iter().take(rows) {
            let mv = child.mv.map(|m| m.to_string()).unwrap_or_default();
            s.push_str(&format!(
                "|{:^10}|{:^10}|{:^10}|{:^10}|{:^10.4}|\n",
                mv, child.hits(), child.wins(), child.losses(), child.mean_score()
            ));
        }
        s
    }
}
