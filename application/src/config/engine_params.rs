//! Engine parameters: orchestration loop control.
//!
//! [`EngineParams`] groups the static parameters that control the round loop
//! in [`AssistantEngine`](crate::use_cases::run_assistant::AssistantEngine)
//! and the pending-action lifetime. These are application-layer concerns,
//! not domain policy.

use chrono::Duration;
use ledger_domain::DEFAULT_PENDING_TTL_MINUTES;

/// Default cap on provider rounds per user message.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Orchestration loop control parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Maximum provider rounds for one user message (turn-based and streamed).
    pub max_rounds: usize,
    /// Lifetime of a pending action.
    pub pending_action_ttl: Duration,
    /// Capacity of the event channel between producer task and consumer.
    pub stream_buffer: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            pending_action_ttl: Duration::minutes(DEFAULT_PENDING_TTL_MINUTES),
            stream_buffer: 64,
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn with_pending_action_ttl(mut self, ttl: Duration) -> Self {
        self.pending_action_ttl = ttl;
        self
    }

    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }
}
