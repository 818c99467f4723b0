//! Pending action repository port

use super::store_error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger_domain::{ActionId, ActionStatus, ConversationId, PendingAction};

/// Storage for pending actions.
///
/// Status changes are conditional: only a `PENDING` record may be moved, so
/// a late expiry sweep cannot overwrite a user's decision.
#[async_trait]
pub trait PendingActionRepository: Send + Sync {
    async fn insert(&self, action: PendingAction) -> Result<(), StoreError>;

    async fn get(&self, id: &ActionId) -> Result<Option<PendingAction>, StoreError>;

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PendingAction>, StoreError>;

    /// Move a `PENDING` record to `status`. Returns `false` when the record
    /// is missing or already resolved.
    async fn resolve_if_pending(
        &self,
        id: &ActionId,
        status: ActionStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Flip every `PENDING` record with `expires_at <= now` to `EXPIRED`.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, StoreError>;
}
