//! Use-case level errors.

use crate::ports::llm_provider::ProviderError;
use crate::ports::store_error::StoreError;
use ledger_domain::{ConversationId, DomainError};
use thiserror::Error;

/// Errors surfaced by the assistant's use cases
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Unknown id, or a conversation owned by another user.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// Unknown id, already resolved, or past its expiry.
    #[error("Action not found or expired")]
    ActionNotFoundOrExpired,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl AssistantError {
    /// Whether the error is the caller's fault (bad id) rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AssistantError::ConversationNotFound(_) | AssistantError::ActionNotFoundOrExpired
        )
    }
}
