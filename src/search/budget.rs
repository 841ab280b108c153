//! Shared, preemptible search budget: node ceiling, clock, depth cap and a stop flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::board::Side;
use crate::eval::MAX_PLY;

const MOVES_TO_GO: u64 = 40;

/// What the caller asked for. All fields are optional; an empty value means "no limit".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub white_time: Option<Duration>,
    pub black_time: Option<Duration>,
    pub white_increment: Option<Duration>,
    pub black_increment: Option<Duration>,
    pub move_time: Option<Duration>,
    pub infinite: bool,
    /// Root moves to consider, in UCI text. Empty means all.
    pub search_moves: Vec<String>,
}

impl SearchLimits {
    pub fn depth(depth: u32) -> Self {
        Self { depth: Some(depth), ..Self::default() }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self { nodes: Some(nodes), ..Self::default() }
    }

    pub fn move_time(ms: u64) -> Self {
        Self { move_time: Some(Duration::from_millis(ms)), ..Self::default() }
    }

    /// Time for this move: fixed move time, else a fortieth of the clock plus the increment.
    pub fn allotted(&self, side: Side) -> Option<Duration> {
        if self.infinite { return None; }
        if let Some(mt) = self.move_time { return Some(mt); }
        let (remaining, inc) = match side {
            Side::White => (self.white_time, self.white_increment),
            Side::Black => (self.black_time, self.black_increment),
        };
        let remaining = remaining?;
        let per_move = remaining / MOVES_TO_GO as u32;
        Some(per_move + inc.unwrap_or_default())
    }
}

/// Clonable handle that stops a running search from another thread.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) { self.0.store(true, Ordering::Relaxed); }
    pub fn is_stopped(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// Budget consulted at every node visit (alpha-beta) or iteration (MCTS).
///
/// Once any limit trips, `stopped` latches so every later check is a single load.
#[derive(Debug)]
pub struct SearchBudget {
    nodes: AtomicU64,
    start: Instant,
    max_nodes: Option<u64>,
    max_depth: u32,
    allotted: Option<Duration>,
    stopped: Arc<AtomicBool>,
    search_moves: Vec<String>,
}

impl SearchBudget {
    pub fn new(limits: &SearchLimits, side: Side) -> Self {
        let max_depth = if limits.infinite {
            MAX_PLY as u32
        } else {
            limits.depth.unwrap_or(MAX_PLY as u32).clamp(1, MAX_PLY as u32)
        };
        Self {
            nodes: AtomicU64::new(0),
            start: Instant::now(),
            max_nodes: limits.nodes,
            max_depth,
            allotted: limits.allotted(side),
            stopped: Arc::new(AtomicBool::new(false)),
            search_moves: limits.search_moves.clone(),
        }
    }

    pub fn unlimited() -> Self { Self::new(&SearchLimits { infinite: true, ..SearchLimits::default() }, Side::White) }

    /// Counts one visited node and returns the running total.
    #[inline]
    pub fn count_node(&self) -> u64 { self.nodes.fetch_add(1, Ordering::Relaxed) + 1 }

    pub fn nodes(&self) -> u64 { self.nodes.load(Ordering::Relaxed) }
    pub fn elapsed(&self) -> Duration { self.start.elapsed() }
    pub fn allotted(&self) -> Option<Duration> { self.allotted }
    pub fn max_depth(&self) -> u32 { self.max_depth }
    pub fn search_moves(&self) -> &[String] { &self.search_moves }

    pub fn is_exhausted(&self) -> bool {
        if self.is_stopped() { return true; }
        let over_nodes = self.max_nodes.is_some_and(|n| self.nodes() >= n);
        let over_time = self.allotted.is_some_and(|t| self.start.elapsed() >= t);
        if over_nodes || over_time {
            self.stop();
            return true;
        }
        false
    }

    pub fn is_stopped(&self) -> bool { self.stopped.load(Ordering::Relaxed) }
    pub fn stop(&self) { self.stopped.store(true, Ordering::Relaxed); }
    pub fn stop_handle(&self) -> StopHandle { StopHandle(Arc::clone(&self.stopped)) }
}
