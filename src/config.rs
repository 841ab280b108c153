//! Engine settings loaded from JSON. Missing fields fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::mcts::MctsParams;
use crate::search::alphabeta::AlphaBetaParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub alphabeta: AlphaBetaParams,
    pub mcts: MctsParams,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |message: &str| Err(EngineError::Config { message: message.to_string() });
        if self.alphabeta.tt_entries < 4 { return fail("alphabeta.tt_entries must be at least 4"); }
        if self.mcts.threads == 0 { return fail("mcts.threads must be at least 1"); }
        if !(self.mcts.exploration > 0.0) { return fail("mcts.exploration must be positive"); }
        if self.mcts.max_playout_plies == 0 { return fail("mcts.max_playout_plies must be at least 1"); }
        if !(self.mcts.win_prob_scale > 0.0) { return fail("mcts.win_prob_scale must be positive"); }
        Ok(())
    }
}
