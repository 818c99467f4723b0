//! Port for structured transcript logging.
//!
//! Defines the [`ConversationLogger`] trait for recording what the engine
//! exchanged with the provider and the tools (requests, responses, tool
//! executions, pending-action decisions) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! transcript in a machine-readable format (JSONL).

use ledger_domain::ConversationId;
use serde_json::{Map, Value};

/// A structured transcript event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "provider_request", "tool_execution").
    pub event_type: &'static str,
    /// Conversation the event belongs to.
    pub conversation_id: ConversationId,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, conversation_id: &ConversationId, payload: Value) -> Self {
        Self {
            event_type,
            conversation_id: conversation_id.clone(),
            payload,
        }
    }

    /// Flatten into one JSON object: `type`, `conversationId`, then the
    /// payload's own fields (a non-object payload lands under `data`).
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("type".into(), Value::String(self.event_type.to_string()));
        record.insert(
            "conversationId".into(),
            Value::String(self.conversation_id.to_string()),
        );
        match self.payload {
            Value::Object(fields) => record.extend(fields),
            Value::Null => {}
            other => {
                record.insert("data".into(), other);
            }
        }
        record
    }
}

/// Port for logging transcript events.
///
/// The `log` method is synchronous and non-fallible; failures are the
/// adapter's concern and never disrupt a turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
