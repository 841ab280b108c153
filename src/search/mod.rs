pub mod alphabeta;
pub mod budget;
pub mod pv;
pub mod tt;

use std::fmt;
use std::time::Duration;

use crate::board::Position;
use crate::eval::{is_mate_score, MATE_SCORE};

pub use budget::{SearchBudget, SearchLimits, StopHandle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    Centipawns(i32),
    /// Mean simulation outcome in [-1, 1] for the side to move.
    WinRate(f64),
}

impl Score {
    /// Moves to mate, positive when the side to move mates.
    pub fn mate_in(&self) -> Option<i32> {
        match *self {
            Score::Centipawns(cp) if is_mate_score(cp) => {
                let plies = MATE_SCORE - cp.abs();
                let moves = (plies + 1) / 2;
                Some(if cp > 0 { moves } else { -moves })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.mate_in()) {
            (_, Some(m)) => write!(f, "mate {m}"),
            (Score::Centipawns(cp), None) => write!(f, "cp {cp}"),
            (Score::WinRate(w), None) => write!(f, "winrate {w:.3}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult<M> {
    pub best_move: Option<M>,
    pub score: Score,
    pub pv: Vec<M>,
    pub depth: u32,
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Common entry point for both strategies. The position is mutated during the
/// search and handed back in the state it was received.
pub trait SearchEngine<P: Position> {
    fn search(&mut self, pos: &mut P, budget: &SearchBudget) -> SearchResult<P::Move>;
}

/// Space-separated UCI text of a move line.
pub fn format_line<M: fmt::Display>(line: &[M]) -> String {
    line.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ")
}
