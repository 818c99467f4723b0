//! Conversation repository port

use super::store_error::StoreError;
use async_trait::async_trait;
use ledger_domain::{Conversation, ConversationId, Message, UserId};

/// Durable, ordered storage for conversations and their messages.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError>;

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Conversations owned by `user_id`, in no particular order.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Conversation>, StoreError>;

    /// Replace the stored conversation record.
    async fn update(&self, conversation: Conversation) -> Result<(), StoreError>;

    /// Remove a conversation and all of its messages. Returns whether it existed.
    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError>;

    /// Append `message` and apply [`Conversation::touch`] to its conversation
    /// in one step, returning the updated conversation.
    async fn append_message(&self, message: Message) -> Result<Conversation, StoreError>;

    /// Messages of a conversation in append order.
    async fn messages(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError>;
}
