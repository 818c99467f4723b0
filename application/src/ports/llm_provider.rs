//! LLM Provider port
//!
//! Defines the interface for communicating with the LLM provider.

use async_trait::async_trait;
use ledger_domain::{ChatMessage, ProviderConfig, ProviderEvent, ToolCall, ToolCatalog};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during provider operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    Configuration(String),
}

/// Provider for LLM communication
///
/// This port defines how the application layer talks to a model. The
/// adapter translates the neutral message/tool representation to its wire
/// protocol. Implementations live in the infrastructure layer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// One turn: returns a single assistant message (text, tool calls, or both).
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &ToolCatalog,
        config: &ProviderConfig,
    ) -> Result<ChatMessage, ProviderError>;

    /// One streamed turn.
    ///
    /// Default implementation calls `chat()` and replays the result as
    /// events, so turn-only adapters work unchanged.
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        tools: &ToolCatalog,
        config: &ProviderConfig,
    ) -> Result<ProviderStream, ProviderError> {
        let message = self.chat(messages, tools, config).await?;
        Ok(ProviderStream::from_message(message))
    }

    /// Best-effort credential check. Failures are `false`, never errors.
    async fn validate_config(&self, config: &ProviderConfig) -> bool;
}

/// Handle for receiving the events of one streamed provider turn.
///
/// Wraps an `mpsc::Receiver<ProviderEvent>`. Single consumer; not
/// restartable.
pub struct ProviderStream {
    pub receiver: mpsc::Receiver<ProviderEvent>,
}

impl ProviderStream {
    pub fn new(receiver: mpsc::Receiver<ProviderEvent>) -> Self {
        Self { receiver }
    }

    /// A stream that yields `events` and then closes.
    pub fn from_events(events: Vec<ProviderEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // capacity covers every event
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Replay a complete assistant message as a stream.
    pub fn from_message(message: ChatMessage) -> Self {
        let mut events = Vec::with_capacity(message.tool_calls.len() + 2);
        if !message.content.is_empty() {
            events.push(ProviderEvent::TextDelta(message.content));
        }
        events.extend(message.tool_calls.into_iter().map(ProviderEvent::ToolCall));
        events.push(ProviderEvent::Done {
            stop_reason: None,
            metadata: message.metadata.unwrap_or_default(),
        });
        Self::from_events(events)
    }

    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and assemble the assistant message.
    pub async fn collect_message(mut self) -> Result<ChatMessage, ProviderError> {
        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                ProviderEvent::TextDelta(chunk) => text.push_str(&chunk),
                ProviderEvent::ToolCall(call) => tool_calls.push(call),
                ProviderEvent::Done { metadata, .. } => {
                    return Ok(ChatMessage::assistant_with_tools(text, tool_calls)
                        .with_metadata(metadata));
                }
                ProviderEvent::Error(e) => return Err(ProviderError::RequestFailed(e)),
            }
        }
        Err(ProviderError::InvalidResponse(
            "stream ended before the turn completed".to_string(),
        ))
    }
}
