//! Pending action workflow
//!
//! Lookups apply expiry lazily: a record past `expires_at` is treated as
//! absent whether or not the sweep has flipped it yet. The sweep only tidies
//! storage.

use super::error::AssistantError;
use crate::ports::clock::Clock;
use crate::ports::pending_action_store::PendingActionRepository;
use chrono::Duration;
use ledger_domain::{ActionId, ActionStatus, ConversationId, PendingAction, ToolArguments, ToolCall};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PendingActionWorkflow {
    actions: Arc<dyn PendingActionRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PendingActionWorkflow {
    pub fn new(
        actions: Arc<dyn PendingActionRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self { actions, clock, ttl }
    }

    /// Record a deferred call. Execution will use `call.arguments`;
    /// `display_args` is only shown to the user.
    pub async fn create_pending_action(
        &self,
        conversation_id: &ConversationId,
        call: &ToolCall,
        display_args: Option<ToolArguments>,
    ) -> Result<PendingAction, AssistantError> {
        let mut action =
            PendingAction::from_call(conversation_id.clone(), call, self.clock.now(), self.ttl);
        if let Some(display_args) = display_args {
            action = action.with_display_args(display_args);
        }
        self.actions.insert(action.clone()).await?;
        info!(
            action_id = %action.id,
            conversation_id = %conversation_id,
            tool = %action.tool_name,
            expires_at = %action.expires_at,
            "Created pending action"
        );
        Ok(action)
    }

    /// A live (`PENDING`, unexpired) action of `conversation_id`, or `None`.
    pub async fn get_pending_action(
        &self,
        id: &ActionId,
        conversation_id: &ConversationId,
    ) -> Result<Option<PendingAction>, AssistantError> {
        let now = self.clock.now();
        Ok(self
            .actions
            .get(id)
            .await?
            .filter(|a| &a.conversation_id == conversation_id && a.is_live_at(now)))
    }

    /// Live actions of a conversation, oldest first.
    pub async fn list_pending_actions(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PendingAction>, AssistantError> {
        let now = self.clock.now();
        let mut live: Vec<PendingAction> = self
            .actions
            .list_for_conversation(conversation_id)
            .await?
            .into_iter()
            .filter(|a| a.is_live_at(now))
            .collect();
        live.sort_by_key(|a| a.created_at);
        Ok(live)
    }

    /// One-shot transition of a `PENDING` action.
    ///
    /// Fails with [`AssistantError::ActionNotFoundOrExpired`] if another
    /// resolution got there first.
    pub async fn resolve_action(
        &self,
        id: &ActionId,
        status: ActionStatus,
    ) -> Result<(), AssistantError> {
        ActionStatus::Pending.transition_to(status)?;
        if self.actions.resolve_if_pending(id, status, self.clock.now()).await? {
            debug!(action_id = %id, status = %status, "Resolved pending action");
            Ok(())
        } else {
            Err(AssistantError::ActionNotFoundOrExpired)
        }
    }

    /// Flip overdue `PENDING` actions to `EXPIRED`; returns how many changed.
    pub async fn expire_old_actions(&self) -> Result<usize, AssistantError> {
        let expired = self.actions.expire_due(self.clock.now()).await?;
        if expired > 0 {
            info!(expired, "Expired pending actions");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::ManualClock;
    use crate::use_cases::run_assistant::testing::MemoryActions;
    use chrono::Utc;

    fn workflow() -> (PendingActionWorkflow, Arc<MemoryActions>, Arc<ManualClock>) {
        let store = Arc::new(MemoryActions::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let workflow =
            PendingActionWorkflow::new(store.clone(), clock.clone(), Duration::minutes(10));
        (workflow, store, clock)
    }

    fn call() -> ToolCall {
        ToolCall::new("toolu_1", "createReminder").with_arg("title", "Send VAT return")
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_conversation() {
        let (workflow, _, _) = workflow();
        let conversation = ConversationId::new("c1");
        let action = workflow
            .create_pending_action(&conversation, &call(), None)
            .await
            .unwrap();

        assert!(workflow.get_pending_action(&action.id, &conversation).await.unwrap().is_some());
        assert!(
            workflow
                .get_pending_action(&action.id, &ConversationId::new("c2"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_expiry_is_lazy() {
        let (workflow, store, clock) = workflow();
        let conversation = ConversationId::new("c1");
        let action = workflow
            .create_pending_action(&conversation, &call(), None)
            .await
            .unwrap();

        clock.advance(Duration::minutes(9));
        assert_eq!(workflow.list_pending_actions(&conversation).await.unwrap().len(), 1);

        clock.advance(Duration::minutes(1));
        assert!(workflow.get_pending_action(&action.id, &conversation).await.unwrap().is_some());

        clock.advance(Duration::seconds(1));
        assert!(workflow.get_pending_action(&action.id, &conversation).await.unwrap().is_none());
        assert!(workflow.list_pending_actions(&conversation).await.unwrap().is_empty());
        assert_eq!(store.all()[0].status, ActionStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_does_not_override_resolution() {
        let (workflow, store, clock) = workflow();
        let conversation = ConversationId::new("c1");
        let approved = workflow
            .create_pending_action(&conversation, &call(), None)
            .await
            .unwrap();
        workflow
            .create_pending_action(&conversation, &call(), None)
            .await
            .unwrap();
        workflow
            .resolve_action(&approved.id, ActionStatus::Approved)
            .await
            .unwrap();

        clock.advance(Duration::minutes(11));
        assert_eq!(workflow.expire_old_actions().await.unwrap(), 1);
        assert_eq!(workflow.expire_old_actions().await.unwrap(), 0);

        let statuses: Vec<ActionStatus> = store.all().iter().map(|a| a.status).collect();
        assert!(statuses.contains(&ActionStatus::Approved));
        assert!(statuses.contains(&ActionStatus::Expired));
    }

    #[tokio::test]
    async fn test_resolution_is_one_shot() {
        let (workflow, _, _) = workflow();
        let action = workflow
            .create_pending_action(&ConversationId::new("c1"), &call(), None)
            .await
            .unwrap();
        workflow.resolve_action(&action.id, ActionStatus::Rejected).await.unwrap();
        assert!(matches!(
            workflow.resolve_action(&action.id, ActionStatus::Approved).await,
            Err(AssistantError::ActionNotFoundOrExpired)
        ));
        assert!(matches!(
            workflow.resolve_action(&action.id, ActionStatus::Pending).await,
            Err(AssistantError::Domain(_))
        ));
    }
}
