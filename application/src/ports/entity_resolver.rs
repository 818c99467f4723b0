//! Entity lookup port
//!
//! Resolves ids in tool arguments to display names for confirmation prompts.

use async_trait::async_trait;
use ledger_domain::UserId;

#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Display name of the user's task `task_id`, if it exists.
    async fn task_name(&self, user_id: &UserId, task_id: &str) -> Option<String>;
}

/// Resolver that never finds anything.
pub struct NoEntityResolver;

#[async_trait]
impl EntityResolver for NoEntityResolver {
    async fn task_name(&self, _user_id: &UserId, _task_id: &str) -> Option<String> {
        None
    }
}
