//! Error types for the engine's fallible edges: position setup and configuration.
//!
//! The searches themselves never fail; running out of budget or meeting an
//! illegal pseudo-legal move is ordinary control flow.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid FEN '{fen}': {reason}")]
    Fen { fen: String, reason: String },

    #[error("illegal move in setup: {0}")]
    IllegalMove(String),

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type EngineResult<T> = Result<T, EngineError>;
