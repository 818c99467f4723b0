//! Streaming events for provider communication.
//!
//! [`ProviderEvent`] is the neutral form of one provider streaming turn. The
//! wire adapter assembles tool calls completely before announcing them, so
//! consumers never see partial argument JSON.

use crate::conversation::entities::MessageMetadata;
use crate::tool::entities::ToolCall;

/// An event in a streaming provider turn.
///
/// A well-formed turn is zero or more `TextDelta`/`ToolCall` events followed by
/// exactly one terminal `Done` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// A text fragment, in order.
    TextDelta(String),
    /// A fully assembled tool call.
    ToolCall(ToolCall),
    /// The turn is complete.
    Done {
        stop_reason: Option<String>,
        metadata: MessageMetadata,
    },
    /// The provider failed mid-turn.
    Error(String),
}

impl ProviderEvent {
    pub fn done() -> Self {
        ProviderEvent::Done {
            stop_reason: None,
            metadata: MessageMetadata::default(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ProviderEvent::TextDelta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProviderEvent::Done { .. } | ProviderEvent::Error(_))
    }
}
