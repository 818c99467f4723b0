//! Conversation log use case
//!
//! Append-only message history per conversation, plus the management
//! operations a client needs (list, rename, archive, delete).

use super::error::AssistantError;
use crate::ports::clock::Clock;
use crate::ports::conversation_store::ConversationRepository;
use crate::ports::pending_action_store::PendingActionRepository;
use ledger_domain::{
    ChatMessage, Conversation, ConversationId, Message, MessageOptions, Role, UserId,
    reconstruct_history,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ConversationLog {
    conversations: Arc<dyn ConversationRepository>,
    actions: Arc<dyn PendingActionRepository>,
    clock: Arc<dyn Clock>,
}

impl ConversationLog {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        actions: Arc<dyn PendingActionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conversations,
            actions,
            clock,
        }
    }

    pub async fn create_conversation(
        &self,
        user_id: &UserId,
    ) -> Result<Conversation, AssistantError> {
        let conversation = Conversation::new(user_id.clone(), self.clock.now());
        self.conversations.create(conversation.clone()).await?;
        info!(conversation_id = %conversation.id, user_id = %user_id, "Created conversation");
        Ok(conversation)
    }

    /// Fetch a conversation owned by `user_id`. Another user's conversation
    /// is reported as not found.
    pub async fn get_conversation(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Conversation, AssistantError> {
        match self.conversations.get(id).await? {
            Some(conversation) if conversation.is_owned_by(user_id) => Ok(conversation),
            _ => Err(AssistantError::ConversationNotFound(id.clone())),
        }
    }

    /// Existing conversation when `id` is given, a fresh one otherwise.
    pub async fn get_or_create(
        &self,
        id: Option<&ConversationId>,
        user_id: &UserId,
    ) -> Result<Conversation, AssistantError> {
        match id {
            Some(id) => self.get_conversation(id, user_id).await,
            None => self.create_conversation(user_id).await,
        }
    }

    /// Active conversations, most recently updated first.
    pub async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, AssistantError> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    pub async fn rename_conversation(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        title: &str,
    ) -> Result<Conversation, AssistantError> {
        let mut conversation = self.get_conversation(id, user_id).await?;
        conversation.title = title.trim().to_string();
        conversation.updated_at = self.clock.now();
        self.conversations.update(conversation.clone()).await?;
        Ok(conversation)
    }

    /// Soft delete: the conversation disappears from listings but keeps its log.
    pub async fn archive_conversation(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<(), AssistantError> {
        let mut conversation = self.get_conversation(id, user_id).await?;
        conversation.is_active = false;
        conversation.updated_at = self.clock.now();
        self.conversations.update(conversation).await?;
        Ok(())
    }

    /// Hard delete, including messages and pending actions.
    pub async fn delete_conversation(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<(), AssistantError> {
        self.get_conversation(id, user_id).await?;
        let actions = self.actions.delete_for_conversation(id).await?;
        self.conversations.delete(id).await?;
        info!(conversation_id = %id, actions, "Deleted conversation");
        Ok(())
    }

    /// Append a message. The first `user` message of a conversation still
    /// carrying the default title renames it.
    pub async fn add_message(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
        options: MessageOptions,
    ) -> Result<Message, AssistantError> {
        let message = Message::new(
            conversation_id.clone(),
            role,
            content,
            options,
            self.clock.now(),
        );
        let conversation = self.conversations.append_message(message.clone()).await?;
        debug!(
            conversation_id = %conversation_id,
            role = %role,
            tool_calls = message.tool_calls.len(),
            title = %conversation.title,
            "Appended message"
        );
        Ok(message)
    }

    /// Append a provider-facing message as is.
    pub async fn append_chat(
        &self,
        conversation_id: &ConversationId,
        message: ChatMessage,
    ) -> Result<Message, AssistantError> {
        let options = MessageOptions {
            tool_calls: message.tool_calls,
            tool_call_id: message.tool_call_id,
            metadata: message.metadata,
        };
        self.add_message(conversation_id, message.role, &message.content, options)
            .await
    }

    /// The raw log, in append order.
    pub async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, AssistantError> {
        Ok(self.conversations.messages(conversation_id).await?)
    }

    /// The log reconstructed for the provider, without a system message.
    pub async fn provider_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, AssistantError> {
        let messages = self.messages(conversation_id).await?;
        Ok(reconstruct_history(&messages)
            .into_iter()
            .map(Message::to_chat)
            .collect())
    }
}
