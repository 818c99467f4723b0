//! Engine settings from TOML (`[assistant]` section)

use chrono::Duration;
use ledger_application::config::{DEFAULT_MAX_ROUNDS, EngineParams};
use ledger_domain::DEFAULT_PENDING_TTL_MINUTES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAssistantConfig {
    /// Provider rounds per user message (default: 5)
    pub max_rounds: usize,
    /// Minutes a pending action stays approvable (default: 10)
    pub pending_action_ttl_minutes: i64,
    /// Directory for JSONL transcripts; unset disables them
    pub transcript_dir: Option<PathBuf>,
    /// Acting user for the local CLI
    pub user_id: String,
    /// Seconds between expiry sweeps in chat mode (default: 60)
    pub sweep_interval_secs: u64,
}

impl Default for FileAssistantConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            pending_action_ttl_minutes: DEFAULT_PENDING_TTL_MINUTES,
            transcript_dir: None,
            user_id: "local".to_string(),
            sweep_interval_secs: 60,
        }
    }
}

impl FileAssistantConfig {
    pub fn to_engine_params(&self) -> EngineParams {
        EngineParams::default()
            .with_max_rounds(self.max_rounds)
            .with_pending_action_ttl(Duration::minutes(self.pending_action_ttl_minutes.max(1)))
    }
}
