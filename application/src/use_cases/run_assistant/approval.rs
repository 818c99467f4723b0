//! Approve / reject deferred calls

use super::types::ApprovalOutcome;
use super::{AssistantEngine, AssistantError};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::llm_provider::LlmProvider;
use crate::ports::tool_executor::{ToolContext, ToolExecutorPort};
use ledger_domain::{ActionId, ActionStatus, ChatMessage, ConversationId, ToolCall, UserId};
use serde_json::json;
use tracing::{info, warn};

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> AssistantEngine<P, T> {
    /// Execute a live pending action with its stored arguments.
    ///
    /// Success moves it to `APPROVED` and appends the real tool result under
    /// the original correlation id. Handler failure moves it to `REJECTED`
    /// and appends nothing.
    pub async fn execute_approved_action(
        &self,
        user_id: &UserId,
        conversation_id: &ConversationId,
        action_id: &ActionId,
    ) -> Result<ApprovalOutcome, AssistantError> {
        let conversation = self
            .conversation_log()
            .get_conversation(conversation_id, user_id)
            .await?;
        let _guard = self.locks.acquire(&conversation.id).await;

        let workflow = self.pending_actions();
        let action = workflow
            .get_pending_action(action_id, &conversation.id)
            .await?
            .ok_or(AssistantError::ActionNotFoundOrExpired)?;

        let call = ToolCall::new(&action.tool_call_id, &action.tool_name)
            .with_arguments(action.tool_args.clone());
        let context = ToolContext::new(user_id.clone(), conversation.id.clone());
        let result = self.run_tool(&context, &call).await;

        let status = if result.success {
            ActionStatus::Approved
        } else {
            ActionStatus::Rejected
        };
        if let Err(e) = workflow.resolve_action(&action.id, status).await {
            // the handler has run; its result still stands
            warn!(action_id = %action.id, error = %e, "Could not record action resolution");
        }
        self.log_resolution(&conversation.id, &action.id, status);

        if result.success {
            self.conversation_log()
                .append_chat(
                    &conversation.id,
                    ChatMessage::tool(&action.tool_call_id, result.content()),
                )
                .await?;
            info!(action_id = %action.id, tool = %action.tool_name, "Approved action executed");
            Ok(ApprovalOutcome {
                success: true,
                result: result.output,
                error: None,
            })
        } else {
            let error = result.error.map(|e| e.message);
            warn!(
                action_id = %action.id,
                tool = %action.tool_name,
                error = ?error,
                "Approved action failed"
            );
            Ok(ApprovalOutcome {
                success: false,
                result: None,
                error,
            })
        }
    }

    /// Discard a live pending action. The log is left untouched.
    ///
    /// Waits for any approval running on the same conversation, so an
    /// action whose handler already ran cannot end up `REJECTED`.
    pub async fn reject_action(
        &self,
        action_id: &ActionId,
        conversation_id: &ConversationId,
    ) -> Result<(), AssistantError> {
        let _guard = self.locks.acquire(conversation_id).await;
        let workflow = self.pending_actions();
        let action = workflow
            .get_pending_action(action_id, conversation_id)
            .await?
            .ok_or(AssistantError::ActionNotFoundOrExpired)?;
        workflow.resolve_action(&action.id, ActionStatus::Rejected).await?;
        self.log_resolution(conversation_id, &action.id, ActionStatus::Rejected);
        info!(action_id = %action.id, tool = %action.tool_name, "Action rejected");
        Ok(())
    }

    fn log_resolution(
        &self,
        conversation_id: &ConversationId,
        action_id: &ActionId,
        status: ActionStatus,
    ) {
        self.logger.log(ConversationEvent::new(
            "pending_action_resolved",
            conversation_id,
            json!({ "actionId": action_id, "status": status }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use chrono::Duration;
    use ledger_domain::{ActionStatus, ChatMessage, ConversationId, Role, ToolCall};

    /// Run a turn that defers one createInvoice call.
    async fn deferred_invoice(harness: &Harness) -> (ConversationId, ledger_domain::ActionId) {
        let reply = harness
            .engine
            .process_message(&user(), None, "invoice t1")
            .await
            .unwrap();
        let action_id = reply.pending_actions[0].id.clone();
        (reply.conversation_id, action_id)
    }

    fn invoice_script() -> ScriptedProvider {
        ScriptedProvider::new(vec![
            reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("toolu_inv", "createInvoice").with_arg("taskId", "t1")],
            )),
            reply(ChatMessage::assistant("Waiting for your confirmation.")),
        ])
    }

    #[tokio::test]
    async fn test_approve_runs_handler_once_and_appends_result() {
        let harness = Harness::new(invoice_script());
        let (conversation_id, action_id) = deferred_invoice(&harness).await;
        let before = harness.messages(&conversation_id).await.len();

        let outcome = harness
            .engine
            .execute_approved_action(&user(), &conversation_id, &action_id)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.result.as_ref().unwrap()["invoiceId"], "inv-1");
        assert_eq!(harness.tools.count("createInvoice"), 1);
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Approved);

        let messages = harness.messages(&conversation_id).await;
        assert_eq!(messages.len(), before + 1);
        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("toolu_inv"));

        // one-shot: a second approval finds nothing
        let again = harness
            .engine
            .execute_approved_action(&user(), &conversation_id, &action_id)
            .await
            .unwrap_err();
        assert!(again.is_not_found());
        assert_eq!(harness.tools.count("createInvoice"), 1);
    }

    #[tokio::test]
    async fn test_reject_leaves_log_untouched() {
        let harness = Harness::new(invoice_script());
        let (conversation_id, action_id) = deferred_invoice(&harness).await;
        let before = harness.messages(&conversation_id).await.len();

        harness.engine.reject_action(&action_id, &conversation_id).await.unwrap();

        assert_eq!(harness.actions.all()[0].status, ActionStatus::Rejected);
        assert!(harness.actions.all()[0].resolved_at.is_some());
        assert_eq!(harness.messages(&conversation_id).await.len(), before);
        assert_eq!(harness.tools.count("createInvoice"), 0);

        let err = harness
            .engine
            .execute_approved_action(&user(), &conversation_id, &action_id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reject_waits_for_running_approval() {
        let harness = Harness::new(invoice_script());
        let (conversation_id, action_id) = deferred_invoice(&harness).await;
        harness.tools.slow_invoices(std::time::Duration::from_millis(100));

        let engine = harness.engine.clone();
        let (approve_conversation, approve_action) = (conversation_id.clone(), action_id.clone());
        let approval = tokio::spawn(async move {
            engine
                .execute_approved_action(&user(), &approve_conversation, &approve_action)
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let rejected = harness.engine.reject_action(&action_id, &conversation_id).await;
        assert!(matches!(
            rejected,
            Err(super::AssistantError::ActionNotFoundOrExpired)
        ));

        let outcome = approval.await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(harness.tools.count("createInvoice"), 1);
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Approved);
    }

    #[tokio::test]
    async fn test_expired_action_is_indistinguishable_from_missing() {
        let harness = Harness::new(invoice_script());
        let (conversation_id, action_id) = deferred_invoice(&harness).await;

        harness.clock.advance(Duration::minutes(10) + Duration::seconds(1));

        let err = harness
            .engine
            .execute_approved_action(&user(), &conversation_id, &action_id)
            .await
            .unwrap_err();
        assert!(matches!(err, super::AssistantError::ActionNotFoundOrExpired));
        assert!(harness.engine.reject_action(&action_id, &conversation_id).await.is_err());
        assert_eq!(harness.tools.count("createInvoice"), 0);
        // lazily expired: the store still says PENDING until the sweep runs
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Pending);

        let swept = harness.engine.pending_actions().expire_old_actions().await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Expired);
    }

    #[tokio::test]
    async fn test_handler_failure_rejects_action() {
        let harness = Harness::new(invoice_script());
        let (conversation_id, action_id) = deferred_invoice(&harness).await;
        let before = harness.messages(&conversation_id).await.len();
        harness.tools.fail_invoices();

        let outcome = harness
            .engine
            .execute_approved_action(&user(), &conversation_id, &action_id)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("invoice service unavailable"));
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Rejected);
        assert_eq!(harness.messages(&conversation_id).await.len(), before);
    }

    #[tokio::test]
    async fn test_action_of_other_conversation_is_not_found() {
        let harness = Harness::new(invoice_script());
        let (_, action_id) = deferred_invoice(&harness).await;
        let other = harness
            .engine
            .conversation_log()
            .create_conversation(&user())
            .await
            .unwrap();

        let err = harness.engine.reject_action(&action_id, &other.id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(harness.actions.all()[0].status, ActionStatus::Pending);
    }
}
