// Move-search core: alpha-beta and MCTS over a pluggable board and evaluator
pub mod board;
pub mod config;
pub mod error;
pub mod eval;
pub mod mcts;
pub mod perft;
pub mod search;

pub use board::cozy::CozyPosition;
pub use board::{Position, Side};
pub use error::{EngineError, EngineResult};
pub use search::{Score, SearchEngine, SearchResult};
