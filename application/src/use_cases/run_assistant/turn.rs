//! Turn-based path: one call returns the final reply.

use super::types::AssistantReply;
use super::{AssistantEngine, AssistantError};
use crate::ports::llm_provider::LlmProvider;
use crate::ports::tool_executor::{ToolContext, ToolExecutorPort};
use ledger_domain::{ConversationId, MessageOptions, PendingActionSummary, Role, UserId};
use tracing::{info, warn};

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> AssistantEngine<P, T> {
    /// Run one user message to completion.
    ///
    /// `conversation_id` of `None` starts a new conversation. Provider
    /// failures are returned as errors; tool failures are fed back to the
    /// provider as results.
    pub async fn process_message(
        &self,
        user_id: &UserId,
        conversation_id: Option<&ConversationId>,
        text: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let log = self.conversation_log();
        let conversation = log.get_or_create(conversation_id, user_id).await?;
        let _guard = self.locks.acquire(&conversation.id).await;
        let context = ToolContext::new(user_id.clone(), conversation.id.clone());

        log.add_message(&conversation.id, Role::User, text, MessageOptions::default())
            .await?;
        let config = self.provider_config.get().await?;

        let mut pending_actions = Vec::new();
        let mut last_text = String::new();

        for round in 1..=self.params.max_rounds {
            let messages = self.provider_messages(&conversation.id).await?;
            self.log_provider_request(&conversation.id, round, &messages, false);

            let reply = self
                .provider
                .chat(&messages, self.tools.definitions(), &config)
                .await?;
            self.log_provider_response(&conversation.id, round, &reply);
            if !reply.content.is_empty() {
                last_text = reply.content.clone();
            }

            if !reply.has_tool_calls() {
                let response_text = reply.content.clone();
                log.append_chat(&conversation.id, reply).await?;
                info!(
                    conversation_id = %conversation.id,
                    rounds = round,
                    pending = pending_actions.len(),
                    "Turn complete"
                );
                return Ok(AssistantReply {
                    conversation_id: conversation.id,
                    response_text,
                    pending_actions,
                    truncated: false,
                });
            }

            let calls = reply.tool_calls.clone();
            log.append_chat(&conversation.id, reply).await?;
            for call in &calls {
                let outcome = self.handle_call(&context, call).await?;
                log.append_chat(&conversation.id, outcome.message).await?;
                if let Some(action) = &outcome.pending {
                    pending_actions.push(PendingActionSummary::from(action));
                }
            }
        }

        warn!(
            conversation_id = %conversation.id,
            max_rounds = self.params.max_rounds,
            "Round cap reached; returning truncated reply"
        );
        Ok(AssistantReply {
            conversation_id: conversation.id,
            response_text: last_text,
            pending_actions,
            truncated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::ports::llm_provider::ProviderError;
    use chrono::Duration;
    use ledger_domain::{ActionStatus, ChatMessage, Role, ToolCall};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_plain_answer_is_appended() {
        let harness = Harness::new(ScriptedProvider::new(vec![reply(ChatMessage::assistant(
            "Hello! How can I help?",
        ))]));

        let reply = harness.engine.process_message(&user(), None, "hi").await.unwrap();
        assert_eq!(reply.response_text, "Hello! How can I help?");
        assert!(reply.pending_actions.is_empty());
        assert!(!reply.truncated);

        let messages = harness.messages(&reply.conversation_id).await;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);

        let conversation = harness.conversation(&reply.conversation_id).await;
        assert_eq!(conversation.title, "hi");
    }

    #[tokio::test]
    async fn test_immediate_tool_result_is_fed_back() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("toolu_1", "listTasks")],
            )),
            reply(ChatMessage::assistant("You have one task: Website redesign.")),
        ]));

        let reply = harness
            .engine
            .process_message(&user(), None, "what are my tasks?")
            .await
            .unwrap();
        assert_eq!(reply.response_text, "You have one task: Website redesign.");
        assert_eq!(harness.tools.count("listTasks"), 1);

        // second request carries the tool result right after its announcement
        let second = harness.provider.request(1);
        let tail: Vec<Role> = second.iter().skip(1).map(|m| m.role).collect();
        assert_eq!(tail, vec![Role::User, Role::Assistant, Role::Tool]);
        let result: Value = serde_json::from_str(&second[3].content).unwrap();
        assert_eq!(result[0]["id"], "t1");
        assert_eq!(second[3].tool_call_id.as_deref(), Some("toolu_1"));
    }

    #[tokio::test]
    async fn test_create_invoice_is_deferred() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            reply(ChatMessage::assistant_with_tools(
                "I'll prepare that invoice.",
                vec![ToolCall::new("toolu_9", "createInvoice").with_arg("taskId", "t1")],
            )),
            reply(ChatMessage::assistant("The invoice is waiting for your confirmation.")),
        ]));

        let reply = harness
            .engine
            .process_message(&user(), None, "invoice client X for January")
            .await
            .unwrap();

        assert_eq!(harness.tools.count("createInvoice"), 0);
        assert_eq!(reply.pending_actions.len(), 1);
        let summary = &reply.pending_actions[0];
        assert_eq!(summary.tool_name, "createInvoice");
        assert_eq!(Value::Object(summary.tool_args.clone()), json!({"taskId": "t1"}));
        assert_eq!(
            summary.display_args.as_ref().unwrap()["taskName"],
            "Website redesign"
        );
        assert_eq!(summary.expires_at, harness.clock_now() + Duration::minutes(10));

        let stored = harness.actions.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, ActionStatus::Pending);
        assert_eq!(stored[0].tool_call_id, "toolu_9");

        let messages = harness.messages(&reply.conversation_id).await;
        let tool_message = messages.iter().find(|m| m.role == Role::Tool).unwrap();
        let content: Value = serde_json::from_str(&tool_message.content).unwrap();
        assert_eq!(content["status"], "awaiting_confirmation");
        assert_eq!(content["pendingActionId"], summary.id.as_str());
    }

    #[tokio::test]
    async fn test_tool_failure_is_folded_into_result() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("toolu_1", "explode")],
            )),
            reply(ChatMessage::assistant("Something went wrong.")),
        ]));

        let reply = harness.engine.process_message(&user(), None, "boom").await.unwrap();
        assert_eq!(reply.response_text, "Something went wrong.");

        let messages = harness.messages(&reply.conversation_id).await;
        let content: Value = serde_json::from_str(&messages[2].content).unwrap();
        assert_eq!(content["code"], "EXECUTION_FAILED");
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_not_found() {
        let harness = Harness::new(ScriptedProvider::new(vec![
            reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("toolu_1", "deleteEverything")],
            )),
            reply(ChatMessage::assistant("I can't do that.")),
        ]));

        let reply = harness.engine.process_message(&user(), None, "nuke").await.unwrap();
        let messages = harness.messages(&reply.conversation_id).await;
        let content: Value = serde_json::from_str(&messages[2].content).unwrap();
        assert_eq!(content["code"], "TOOL_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_round_cap_truncates() {
        let harness = Harness::new(ScriptedProvider::always_tool("listTasks"));

        let reply = harness.engine.process_message(&user(), None, "loop").await.unwrap();
        assert!(reply.truncated);
        assert_eq!(harness.provider.calls(), 5);
        assert_eq!(harness.tools.count("listTasks"), 5);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let harness = Harness::new(ScriptedProvider::new(vec![fail(
            ProviderError::AuthenticationError("bad key".into()),
        )]));

        let err = harness
            .engine
            .process_message(&user(), None, "hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            super::AssistantError::Provider(ProviderError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_other_users_conversation_is_not_found() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let conversation = harness
            .engine
            .conversation_log()
            .create_conversation(&user())
            .await
            .unwrap();

        let err = harness
            .engine
            .process_message(&ledger_domain::UserId::new("intruder"), Some(&conversation.id), "hi")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(harness.provider.calls(), 0);
    }
}
