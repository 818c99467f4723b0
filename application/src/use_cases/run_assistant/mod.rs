//! Run Assistant use case
//!
//! Drives one user message through rounds of
//!
//! ```text
//! ask provider ──▶ text / tool calls ──▶ execute or defer ──▶ feed results back
//!      ▲                                                          │
//!      └──────────────────── until final answer or cap ───────────┘
//! ```
//!
//! | Entry point | Path |
//! |-------------|------|
//! | [`AssistantEngine::process_message`] | turn-based, returns the final reply |
//! | [`AssistantEngine::stream_message`] | streamed, yields [`ChatEvent`]s |
//! | [`AssistantEngine::execute_approved_action`] | runs a deferred call |
//! | [`AssistantEngine::reject_action`] | discards a deferred call |
//!
//! Tools flagged `requires_confirmation` are never executed inside a round.
//! They become pending actions whose tool message tells the provider the
//! call is waiting for the user.

mod approval;
pub mod locks;
mod stream;
mod turn;
mod types;

pub use types::{ApprovalOutcome, AssistantReply, ChatStream};

use super::conversation_log::ConversationLog;
use super::error::AssistantError;
use super::pending_actions::PendingActionWorkflow;
use super::provider_config::ProviderConfigCache;
use crate::config::EngineParams;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::ConversationRepository;
use crate::ports::entity_resolver::EntityResolver;
use crate::ports::llm_provider::LlmProvider;
use crate::ports::pending_action_store::PendingActionRepository;
use crate::ports::settings::SettingsSource;
use crate::ports::tool_executor::{ToolContext, ToolExecutorPort};
use ledger_domain::{
    ArgumentsExt, ChatEvent, ChatMessage, ConversationId, DisplayLookups, PendingAction,
    PendingActionSummary, PromptTemplate, ProviderConfigPatch, ToolCall, ToolResult,
    enrich_display_args,
};
use locks::ConversationLocks;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The orchestration engine.
pub struct AssistantEngine<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> {
    pub(super) provider: Arc<P>,
    pub(super) tools: Arc<T>,
    pub(super) conversations: Arc<dyn ConversationRepository>,
    pub(super) actions: Arc<dyn PendingActionRepository>,
    pub(super) provider_config: Arc<ProviderConfigCache>,
    pub(super) resolver: Option<Arc<dyn EntityResolver>>,
    pub(super) logger: Arc<dyn ConversationLogger>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) params: EngineParams,
    pub(super) locks: Arc<ConversationLocks>,
}

impl<P, T> Clone for AssistantEngine<P, T>
where
    P: LlmProvider + 'static,
    T: ToolExecutorPort + 'static,
{
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            tools: self.tools.clone(),
            conversations: self.conversations.clone(),
            actions: self.actions.clone(),
            provider_config: self.provider_config.clone(),
            resolver: self.resolver.clone(),
            logger: self.logger.clone(),
            clock: self.clock.clone(),
            params: self.params.clone(),
            locks: self.locks.clone(),
        }
    }
}

/// What a single tool call produced inside a round.
pub(super) struct CallOutcome {
    /// The `tool` message answering the call.
    pub message: ChatMessage,
    /// The `tool_result` event for streaming callers.
    pub event: ChatEvent,
    /// Set when the call was deferred.
    pub pending: Option<PendingAction>,
}

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> AssistantEngine<P, T> {
    pub fn new(
        provider: Arc<P>,
        tools: Arc<T>,
        conversations: Arc<dyn ConversationRepository>,
        actions: Arc<dyn PendingActionRepository>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            provider,
            tools,
            conversations,
            actions,
            provider_config: Arc::new(ProviderConfigCache::new(settings)),
            resolver: None,
            logger: Arc::new(NoConversationLogger),
            clock: Arc::new(SystemClock),
            params: EngineParams::default(),
            locks: Arc::new(ConversationLocks::new()),
        }
    }

    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the lookup used to show task names in confirmation prompts
    pub fn with_entity_resolver(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the transcript logger
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn conversation_log(&self) -> ConversationLog {
        ConversationLog::new(
            self.conversations.clone(),
            self.actions.clone(),
            self.clock.clone(),
        )
    }

    pub fn pending_actions(&self) -> PendingActionWorkflow {
        PendingActionWorkflow::new(
            self.actions.clone(),
            self.clock.clone(),
            self.params.pending_action_ttl,
        )
    }

    /// Forget the cached provider configuration; the next turn reloads it.
    pub async fn invalidate_provider_config(&self) {
        self.provider_config.invalidate().await;
    }

    /// Check a candidate configuration against the provider.
    ///
    /// Unset fields fall back to the current configuration. Never errors.
    pub async fn validate_provider_config(&self, patch: &ProviderConfigPatch) -> bool {
        let base = self.provider_config.get().await.unwrap_or_default();
        let candidate = base.merged(patch);
        if !candidate.has_api_key() {
            return false;
        }
        self.provider.validate_config(&candidate).await
    }

    // ==================== Shared round helpers ====================

    /// `[system] + reconstructed history` for the next provider call.
    pub(super) async fn provider_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, AssistantError> {
        let history = self.conversation_log().provider_history(conversation_id).await?;
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(PromptTemplate::system(
            self.clock.now().date_naive(),
            self.tools.definitions(),
        )));
        messages.extend(history);
        Ok(messages)
    }

    /// Execute or defer one announced call.
    pub(super) async fn handle_call(
        &self,
        context: &ToolContext,
        call: &ToolCall,
    ) -> Result<CallOutcome, AssistantError> {
        if self.tools.requires_confirmation(&call.name) {
            let action = self.defer_call(context, call).await?;
            let content = json!({
                "status": "awaiting_confirmation",
                "pendingActionId": action.id,
                "message": PromptTemplate::awaiting_confirmation(&call.name),
            });
            let event = ChatEvent::ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                success: true,
                result: None,
                error: None,
                pending_action: Some(PendingActionSummary::from(&action)),
            };
            Ok(CallOutcome {
                message: ChatMessage::tool(&call.id, content.to_string()),
                event,
                pending: Some(action),
            })
        } else {
            let result = self.run_tool(context, call).await;
            let event = ChatEvent::ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                success: result.success,
                result: result.output.clone(),
                error: result.error.as_ref().map(|e| e.message.clone()),
                pending_action: None,
            };
            Ok(CallOutcome {
                message: ChatMessage::tool(&call.id, result.content()),
                event,
                pending: None,
            })
        }
    }

    /// Run a handler, folding failures into the result.
    pub(super) async fn run_tool(&self, context: &ToolContext, call: &ToolCall) -> ToolResult {
        let started = Instant::now();
        let outcome = self.tools.execute(&call.name, &call.arguments, context).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let result =
            ToolResult::from_handler(&call.id, &call.name, outcome).with_duration(duration_ms);

        if result.success {
            debug!(tool = %call.name, tool_call_id = %call.id, duration_ms, "Tool executed");
        } else {
            warn!(
                tool = %call.name,
                tool_call_id = %call.id,
                error = ?result.error,
                "Tool execution failed"
            );
        }
        self.logger.log(ConversationEvent::new(
            "tool_execution",
            &context.conversation_id,
            json!({
                "toolCallId": call.id,
                "toolName": call.name,
                "arguments": call.arguments,
                "success": result.success,
                "output": result.payload(),
                "durationMs": duration_ms,
            }),
        ));
        result
    }

    /// Create the pending action for a confirmation-required call, with
    /// readable display arguments.
    async fn defer_call(
        &self,
        context: &ToolContext,
        call: &ToolCall,
    ) -> Result<PendingAction, AssistantError> {
        let mut lookups = DisplayLookups::default();
        if let (Some(resolver), Some(task_id)) = (&self.resolver, call.arguments.get_str("taskId"))
            && let Some(name) = resolver.task_name(&context.user_id, task_id).await
        {
            lookups = lookups.with_task_name(name);
        }
        let display_args = enrich_display_args(&call.arguments, &lookups);

        let action = self
            .pending_actions()
            .create_pending_action(&context.conversation_id, call, Some(display_args))
            .await?;
        info!(
            action_id = %action.id,
            tool = %call.name,
            "Deferred tool call for confirmation"
        );
        self.logger.log(ConversationEvent::new(
            "pending_action_created",
            &context.conversation_id,
            json!({
                "actionId": action.id,
                "toolCallId": call.id,
                "toolName": call.name,
                "arguments": call.arguments,
                "expiresAt": action.expires_at.to_rfc3339(),
            }),
        ));
        Ok(action)
    }

    pub(super) fn log_provider_request(
        &self,
        conversation_id: &ConversationId,
        round: usize,
        messages: &[ChatMessage],
        streaming: bool,
    ) {
        debug!(
            conversation_id = %conversation_id,
            round,
            messages = messages.len(),
            streaming,
            "Calling provider"
        );
        self.logger.log(ConversationEvent::new(
            "provider_request",
            conversation_id,
            json!({
                "round": round,
                "streaming": streaming,
                "messages": messages,
                "tools": self.tools.definitions().names().collect::<Vec<_>>(),
            }),
        ));
    }

    pub(super) fn log_provider_response(
        &self,
        conversation_id: &ConversationId,
        round: usize,
        message: &ChatMessage,
    ) {
        self.logger.log(ConversationEvent::new(
            "provider_response",
            conversation_id,
            json!({
                "round": round,
                "content": message.content,
                "toolCalls": message.tool_calls,
                "metadata": message.metadata,
            }),
        ));
    }
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use ledger_domain::{ProviderConfig, Role};

    #[tokio::test]
    async fn test_system_message_leads_history() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let conversation = harness
            .engine
            .conversation_log()
            .create_conversation(&user())
            .await
            .unwrap();
        harness
            .engine
            .conversation_log()
            .add_message(&conversation.id, Role::User, "hi", Default::default())
            .await
            .unwrap();

        let messages = harness.engine.provider_messages(&conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("createInvoice"));
        assert_eq!(messages[1], ChatMessage::user("hi"));
    }

    #[tokio::test]
    async fn test_validate_provider_config_merges_patch() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let patch = ProviderConfigPatch::default().with_api_key("sk-valid");
        assert!(harness.engine.validate_provider_config(&patch).await);

        let patch = ProviderConfigPatch::default().with_api_key("sk-invalid");
        assert!(!harness.engine.validate_provider_config(&patch).await);

        let blank = ProviderConfigPatch::default().with_api_key("  ");
        assert!(!harness.engine.validate_provider_config(&blank).await);
    }

    #[tokio::test]
    async fn test_invalidate_reloads_settings() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        assert_eq!(harness.engine.provider_config.get().await.unwrap().api_key, "sk-test");

        harness.settings.set(ProviderConfig::new("sk-rotated"));
        assert_eq!(harness.engine.provider_config.get().await.unwrap().api_key, "sk-test");

        harness.engine.invalidate_provider_config().await;
        assert_eq!(harness.engine.provider_config.get().await.unwrap().api_key, "sk-rotated");
    }
}
