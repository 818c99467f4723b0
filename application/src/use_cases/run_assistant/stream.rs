//! Streaming path
//!
//! A producer task runs the rounds and sends [`ChatEvent`]s into a bounded
//! channel. Within a round, the assistant message and the tool messages are
//! held in memory and written once the round ends, assistant first, so a
//! reader of the log never sees a tool result before its announcement.

use super::types::ChatStream;
use super::{AssistantEngine, AssistantError};
use crate::ports::llm_provider::LlmProvider;
use crate::ports::tool_executor::{ToolContext, ToolExecutorPort};
use ledger_domain::{
    ChatEvent, ChatMessage, Conversation, ConversationId, DoneReason, MessageMetadata,
    MessageOptions, ProviderEvent, Role, ToolCall, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sending half of a [`ChatStream`]; remembers when the consumer left.
struct Emitter {
    tx: mpsc::Sender<ChatEvent>,
    open: bool,
}

impl Emitter {
    fn new(tx: mpsc::Sender<ChatEvent>) -> Self {
        Self { tx, open: true }
    }

    /// Send `event`; returns whether the consumer is still listening.
    async fn emit(&mut self, event: ChatEvent) -> bool {
        if self.open && self.tx.send(event).await.is_err() {
            self.open = false;
        }
        self.open
    }
}

/// Messages produced during one round, not yet persisted.
#[derive(Default)]
struct RoundBuffer {
    text: String,
    calls: Vec<ToolCall>,
    tool_messages: Vec<ChatMessage>,
}

enum RoundEnd {
    Complete(MessageMetadata),
    Failed(String),
    Disconnected,
}

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> AssistantEngine<P, T> {
    /// Run one user message, streaming events as they happen.
    ///
    /// The conversation is resolved before this returns; everything else
    /// happens in a spawned task. The stream always ends with exactly one
    /// `done` event unless the consumer dropped it first.
    pub async fn stream_message(
        &self,
        user_id: &UserId,
        conversation_id: Option<&ConversationId>,
        text: &str,
    ) -> Result<ChatStream, AssistantError> {
        let conversation = self
            .conversation_log()
            .get_or_create(conversation_id, user_id)
            .await?;
        let (tx, rx) = mpsc::channel(self.params.stream_buffer);
        let stream = ChatStream::new(conversation.id.clone(), rx);

        let engine = self.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            engine.produce(conversation, text, Emitter::new(tx)).await;
        });

        Ok(stream)
    }

    async fn produce(&self, conversation: Conversation, text: String, mut out: Emitter) {
        let _guard = self.locks.acquire(&conversation.id).await;
        let context = ToolContext::new(conversation.user_id.clone(), conversation.id.clone());

        let reason = match self.stream_rounds(&context, &text, &mut out).await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Streamed turn failed");
                out.emit(ChatEvent::error(e.to_string())).await;
                DoneReason::Error
            }
        };

        if !out.emit(ChatEvent::done(conversation.id.clone(), reason)).await {
            debug!(conversation_id = %conversation.id, "Consumer left before done");
        }
    }

    async fn stream_rounds(
        &self,
        context: &ToolContext,
        text: &str,
        out: &mut Emitter,
    ) -> Result<DoneReason, AssistantError> {
        let conversation_id = &context.conversation_id;
        self.conversation_log()
            .add_message(conversation_id, Role::User, text, MessageOptions::default())
            .await?;
        let config = self.provider_config.get().await?;

        for round in 1..=self.params.max_rounds {
            let messages = self.provider_messages(conversation_id).await?;
            self.log_provider_request(conversation_id, round, &messages, true);
            let mut events = self
                .provider
                .stream_chat(&messages, self.tools.definitions(), &config)
                .await?;

            let mut buffer = RoundBuffer::default();
            let end = loop {
                let Some(event) = events.recv().await else {
                    break RoundEnd::Failed(
                        "provider stream ended before the turn completed".to_string(),
                    );
                };
                match event {
                    ProviderEvent::TextDelta(chunk) => {
                        buffer.text.push_str(&chunk);
                        if !out.emit(ChatEvent::text(chunk)).await {
                            break RoundEnd::Disconnected;
                        }
                    }
                    ProviderEvent::ToolCall(call) => {
                        let announced = out
                            .emit(ChatEvent::ToolUse {
                                tool_call_id: call.id.clone(),
                                tool_name: call.name.clone(),
                                tool_args: call.arguments.clone(),
                                requires_confirmation: self.tools.requires_confirmation(&call.name),
                            })
                            .await;
                        if !announced {
                            break RoundEnd::Disconnected;
                        }
                        let outcome = match self.handle_call(context, &call).await {
                            Ok(outcome) => outcome,
                            Err(e) => break RoundEnd::Failed(e.to_string()),
                        };
                        buffer.calls.push(call);
                        buffer.tool_messages.push(outcome.message);
                        if !out.emit(outcome.event).await {
                            break RoundEnd::Disconnected;
                        }
                    }
                    ProviderEvent::Done { metadata, .. } => break RoundEnd::Complete(metadata),
                    ProviderEvent::Error(message) => break RoundEnd::Failed(message),
                }
            };

            let metadata = match &end {
                RoundEnd::Complete(metadata) => Some(metadata.clone()),
                _ => None,
            };
            let requested_tools = !buffer.calls.is_empty();
            if let RoundEnd::Complete(_) = &end {
                let assembled =
                    ChatMessage::assistant_with_tools(&buffer.text, buffer.calls.clone());
                self.log_provider_response(conversation_id, round, &assembled);
            }
            self.flush_round(conversation_id, buffer, metadata).await?;

            match end {
                RoundEnd::Complete(_) if requested_tools => continue,
                RoundEnd::Complete(_) => {
                    info!(
                        conversation_id = %conversation_id,
                        rounds = round,
                        "Streamed turn complete"
                    );
                    return Ok(DoneReason::Complete);
                }
                RoundEnd::Failed(message) => {
                    warn!(
                        conversation_id = %conversation_id,
                        round,
                        error = %message,
                        "Provider failed mid-stream"
                    );
                    out.emit(ChatEvent::error(message)).await;
                    return Ok(DoneReason::Error);
                }
                RoundEnd::Disconnected => {
                    info!(
                        conversation_id = %conversation_id,
                        round,
                        "Consumer disconnected; stopping"
                    );
                    return Ok(DoneReason::Complete);
                }
            }
        }

        warn!(
            conversation_id = %conversation_id,
            max_rounds = self.params.max_rounds,
            "Round cap reached while tools were still requested"
        );
        Ok(DoneReason::MaxIterations)
    }

    /// Persist a round: the assistant message, then its tool messages.
    async fn flush_round(
        &self,
        conversation_id: &ConversationId,
        buffer: RoundBuffer,
        metadata: Option<MessageMetadata>,
    ) -> Result<(), AssistantError> {
        let log = self.conversation_log();
        if !buffer.text.is_empty() || !buffer.calls.is_empty() {
            let options = MessageOptions::default()
                .with_tool_calls(buffer.calls)
                .with_metadata(metadata);
            log.add_message(conversation_id, Role::Assistant, &buffer.text, options)
                .await?;
        }
        for message in buffer.tool_messages {
            log.append_chat(conversation_id, message).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::config::EngineParams;
    use futures::StreamExt;
    use ledger_domain::{
        ActionStatus, ChatEvent, DoneReason, MessageMetadata, ProviderEvent, Role, ToolCall,
    };
    use serde_json::Value;

    fn kinds(events: &[ChatEvent]) -> Vec<&'static str> {
        events.iter().map(ChatEvent::kind).collect()
    }

    fn done_reason(events: &[ChatEvent]) -> DoneReason {
        match events.last() {
            Some(ChatEvent::Done { reason, .. }) => *reason,
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_is_streamed_and_persisted_once() {
        let harness = Harness::new(ScriptedProvider::new(vec![events(vec![
            ProviderEvent::TextDelta("Hello".into()),
            ProviderEvent::TextDelta(", there".into()),
            ProviderEvent::Done {
                stop_reason: Some("end_turn".into()),
                metadata: MessageMetadata {
                    output_tokens: Some(4),
                    ..Default::default()
                },
            },
        ])]));

        let stream = harness.engine.stream_message(&user(), None, "hi").await.unwrap();
        let conversation_id = stream.conversation_id().clone();
        let events: Vec<ChatEvent> = stream.collect().await;

        assert_eq!(kinds(&events), vec!["text", "text", "done"]);
        assert_eq!(done_reason(&events), DoneReason::Complete);

        let messages = harness.messages(&conversation_id).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hello, there");
        assert_eq!(messages[1].metadata.as_ref().unwrap().output_tokens, Some(4));
    }

    #[tokio::test]
    async fn test_round_persists_assistant_before_tools() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            events(vec![
                ProviderEvent::TextDelta("Checking.".into()),
                ProviderEvent::ToolCall(ToolCall::new("toolu_a", "listTasks")),
                ProviderEvent::ToolCall(
                    ToolCall::new("toolu_b", "getTask").with_arg("taskId", "t1"),
                ),
                ProviderEvent::done(),
            ]),
            events(vec![ProviderEvent::TextDelta("Done.".into()), ProviderEvent::done()]),
        ]));

        let stream = harness.engine.stream_message(&user(), None, "tasks").await.unwrap();
        let conversation_id = stream.conversation_id().clone();
        let events = stream.collect_events().await;

        assert_eq!(
            kinds(&events),
            vec!["text", "tool_use", "tool_result", "tool_use", "tool_result", "text", "done"]
        );

        let messages = harness.messages(&conversation_id).await;
        let shape: Vec<(Role, Option<&str>)> = messages
            .iter()
            .map(|m| (m.role, m.tool_call_id.as_deref()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Role::User, None),
                (Role::Assistant, None),
                (Role::Tool, Some("toolu_a")),
                (Role::Tool, Some("toolu_b")),
                (Role::Assistant, None),
            ]
        );
        assert_eq!(messages[1].tool_calls.len(), 2);
        assert_eq!(harness.tools.count("listTasks"), 1);
        assert_eq!(harness.tools.count("getTask"), 1);
    }

    #[tokio::test]
    async fn test_always_tool_provider_stops_after_five_rounds() {
        let harness = Harness::new(ScriptedProvider::always_tool("listTasks"));

        let stream = harness.engine.stream_message(&user(), None, "loop").await.unwrap();
        let events = stream.collect_events().await;

        assert_eq!(harness.provider.calls(), 5);
        assert_eq!(events.iter().filter(|e| e.is_done()).count(), 1);
        assert_eq!(done_reason(&events), DoneReason::MaxIterations);
    }

    #[tokio::test]
    async fn test_confirmation_tool_emits_pending_action() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            events(vec![
                ProviderEvent::ToolCall(
                    ToolCall::new("toolu_inv", "createInvoice")
                        .with_arg("taskId", "t1")
                        .with_arg("rate", 80)
                        .with_arg("hours", 10)
                        .with_arg("month", 1)
                        .with_arg("year", 2025),
                ),
                ProviderEvent::done(),
            ]),
            events(vec![
                ProviderEvent::TextDelta("Please confirm the invoice.".into()),
                ProviderEvent::done(),
            ]),
        ]));

        let events = harness
            .engine
            .stream_message(&user(), None, "invoice January")
            .await
            .unwrap()
            .collect_events()
            .await;

        assert_eq!(harness.tools.count("createInvoice"), 0);
        let Some(ChatEvent::ToolUse { requires_confirmation, .. }) = events.first() else {
            panic!("expected tool_use first");
        };
        assert!(*requires_confirmation);

        let Some(ChatEvent::ToolResult { pending_action: Some(pending), tool_call_id, .. }) =
            events.get(1)
        else {
            panic!("expected tool_result with pending action");
        };
        assert_eq!(tool_call_id, "toolu_inv");
        let display = pending.display_args.as_ref().unwrap();
        assert_eq!(display["taskName"], "Website redesign");
        assert_eq!(display["total"], serde_json::json!(800.0));
        assert_eq!(display["period"], "January 2025");
        assert!(!pending.tool_args.contains_key("taskName"));

        let stored = harness.actions.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, ActionStatus::Pending);
        assert_eq!(stored[0].tool_call_id, "toolu_inv");
    }

    #[tokio::test]
    async fn test_provider_error_after_tool_persists_round() {
        let harness = Harness::new(ScriptedProvider::new(vec![events(vec![
            ProviderEvent::ToolCall(ToolCall::new("toolu_a", "listTasks")),
            ProviderEvent::Error("overloaded_error: Overloaded".into()),
        ])]));

        let stream = harness.engine.stream_message(&user(), None, "tasks").await.unwrap();
        let conversation_id = stream.conversation_id().clone();
        let events = stream.collect_events().await;

        assert_eq!(kinds(&events), vec!["tool_use", "tool_result", "error", "done"]);
        assert_eq!(done_reason(&events), DoneReason::Error);

        let messages = harness.messages(&conversation_id).await;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_yields_error_then_done() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        harness.settings.set(ledger_domain::ProviderConfig::default());

        let events = harness
            .engine
            .stream_message(&user(), None, "hi")
            .await
            .unwrap()
            .collect_events()
            .await;

        assert_eq!(kinds(&events), vec!["error", "done"]);
        assert_eq!(harness.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_dropped_consumer_stops_producer() {
        let harness = Harness::with_params(
            ScriptedProvider::always_tool("listTasks"),
            EngineParams::default().with_stream_buffer(1),
        );

        let mut stream = harness.engine.stream_message(&user(), None, "loop").await.unwrap();
        let conversation_id = stream.conversation_id().clone();
        assert!(stream.recv().await.is_some());
        drop(stream);

        // the producer releases the conversation lock once it stops
        let _guard = harness.engine.locks.acquire(&conversation_id).await;
        assert!(harness.provider.calls() < 5);

        let messages = harness.messages(&conversation_id).await;
        for (idx, message) in messages.iter().enumerate() {
            if message.role == Role::Tool {
                assert_eq!(messages[idx - 1].role, Role::Assistant);
                let answered: Value = serde_json::from_str(&message.content).unwrap();
                assert!(answered.is_array());
            }
        }
    }
}
