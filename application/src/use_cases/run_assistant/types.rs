//! Type definitions for the assistant engine.

use futures::Stream;
use ledger_domain::{ChatEvent, ConversationId, PendingActionSummary};
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Result of a turn-based exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub conversation_id: ConversationId,
    /// Text of the final assistant message.
    pub response_text: String,
    /// Actions created during this turn that await the user's decision.
    pub pending_actions: Vec<PendingActionSummary>,
    /// The round cap was reached while the provider still requested tools.
    pub truncated: bool,
}

/// Result of executing an approved action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Events of one streamed turn.
///
/// Finite and single-consumer. Dropping it stops the producer at its next
/// emit, after it persists what it already executed.
pub struct ChatStream {
    conversation_id: ConversationId,
    receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatStream {
    pub fn new(conversation_id: ConversationId, receiver: mpsc::Receiver<ChatEvent>) -> Self {
        Self {
            conversation_id,
            receiver,
        }
    }

    /// The conversation this turn belongs to (fresh when none was given).
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream to its end.
    pub async fn collect_events(mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for ChatStream {
    type Item = ChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
