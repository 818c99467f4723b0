//! In-memory stores
//!
//! Process-local implementations of the persistence ports. Each store keeps
//! its records behind one `tokio::sync::RwLock`, so a message append and the
//! conversation touch it triggers happen under the same write guard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger_application::ports::conversation_store::ConversationRepository;
use ledger_application::ports::pending_action_store::PendingActionRepository;
use ledger_application::ports::store_error::StoreError;
use ledger_domain::{
    ActionId, ActionStatus, Conversation, ConversationId, Message, PendingAction, UserId,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct ConversationTables {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
}

/// Conversations and their append-only message logs.
#[derive(Default)]
pub struct InMemoryConversationStore {
    tables: RwLock<ConversationTables>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationStore {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.messages.entry(conversation.id.clone()).or_default();
        tables
            .conversations
            .insert(conversation.id.clone(), conversation);
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.tables.read().await.conversations.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .conversations
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn update(&self, conversation: Conversation) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.conversations.get_mut(&conversation.id) {
            Some(existing) => {
                *existing = conversation;
                Ok(())
            }
            None => Err(StoreError::NotFound(conversation.id.to_string())),
        }
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.messages.remove(id);
        Ok(tables.conversations.remove(id).is_some())
    }

    async fn append_message(&self, message: Message) -> Result<Conversation, StoreError> {
        let mut tables = self.tables.write().await;
        let conversation = tables
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| StoreError::NotFound(message.conversation_id.to_string()))?;

        if conversation.touch(message.role, &message.content, message.created_at) {
            tracing::debug!(
                conversation = %conversation.id,
                title = %conversation.title,
                "Conversation titled"
            );
        }
        let updated = conversation.clone();

        tables
            .messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
        Ok(updated)
    }

    async fn messages(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(id).cloned().unwrap_or_default())
    }
}

/// Pending actions keyed by id.
#[derive(Default)]
pub struct InMemoryPendingActionStore {
    actions: RwLock<HashMap<ActionId, PendingAction>>,
}

impl InMemoryPendingActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.actions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actions.read().await.is_empty()
    }
}

#[async_trait]
impl PendingActionRepository for InMemoryPendingActionStore {
    async fn insert(&self, action: PendingAction) -> Result<(), StoreError> {
        self.actions.write().await.insert(action.id.clone(), action);
        Ok(())
    }

    async fn get(&self, id: &ActionId) -> Result<Option<PendingAction>, StoreError> {
        Ok(self.actions.read().await.get(id).cloned())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PendingAction>, StoreError> {
        let actions = self.actions.read().await;
        Ok(actions
            .values()
            .filter(|a| &a.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn resolve_if_pending(
        &self,
        id: &ActionId,
        status: ActionStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut actions = self.actions.write().await;
        match actions.get_mut(id) {
            Some(action) if action.status == ActionStatus::Pending => {
                action
                    .resolve(status, resolved_at)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut actions = self.actions.write().await;
        let mut expired = 0;
        for action in actions.values_mut() {
            if action.status == ActionStatus::Pending
                && action.is_expired_at(now)
                && action.resolve(ActionStatus::Expired, now).is_ok()
            {
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, StoreError> {
        let mut actions = self.actions.write().await;
        let before = actions.len();
        actions.retain(|_, a| &a.conversation_id != conversation_id);
        Ok(before - actions.len())
    }
}
