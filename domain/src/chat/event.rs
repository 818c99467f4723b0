//! Events emitted to the caller during a streamed turn.

use crate::action::entities::PendingAction;
use crate::core::ids::{ActionId, ConversationId};
use crate::tool::entities::ToolArguments;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    /// The provider produced a final answer.
    Complete,
    /// The round cap was reached while the provider still requested tools.
    MaxIterations,
    /// The provider failed; an `error` event precedes `done`.
    Error,
}

/// Client-facing view of a pending action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingActionSummary {
    pub id: ActionId,
    pub tool_name: String,
    pub tool_args: ToolArguments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_args: Option<ToolArguments>,
    pub expires_at: DateTime<Utc>,
}

impl From<&PendingAction> for PendingActionSummary {
    fn from(action: &PendingAction) -> Self {
        Self {
            id: action.id.clone(),
            tool_name: action.tool_name.clone(),
            tool_args: action.tool_args.clone(),
            display_args: action.display_args.clone(),
            expires_at: action.expires_at,
        }
    }
}

/// One event of a streamed turn, framed as one JSON object per line.
///
/// Every stream ends with exactly one [`ChatEvent::Done`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    Text {
        content: String,
    },
    ToolUse {
        tool_call_id: String,
        tool_name: String,
        tool_args: ToolArguments,
        requires_confirmation: bool,
    },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_action: Option<PendingActionSummary>,
    },
    Error {
        message: String,
    },
    Done {
        conversation_id: ConversationId,
        reason: DoneReason,
    },
}

impl ChatEvent {
    pub fn text(content: impl Into<String>) -> Self {
        ChatEvent::Text {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatEvent::Error {
            message: message.into(),
        }
    }

    pub fn done(conversation_id: ConversationId, reason: DoneReason) -> Self {
        ChatEvent::Done {
            conversation_id,
            reason,
        }
    }

    /// Returns the `type` tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Text { .. } => "text",
            ChatEvent::ToolUse { .. } => "tool_use",
            ChatEvent::ToolResult { .. } => "tool_result",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ChatEvent::Done { .. })
    }
}
