//! Tool Executor port
//!
//! Defines the interface for executing business tools on behalf of a user.

use async_trait::async_trait;
use ledger_domain::{ConversationId, ToolArguments, ToolCatalog, ToolError, UserId};
use serde_json::Value;

/// Who is acting, and in which conversation.
///
/// Handlers hold their own storage handle; the context only scopes the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
}

impl ToolContext {
    pub fn new(user_id: UserId, conversation_id: ConversationId) -> Self {
        Self {
            user_id,
            conversation_id,
        }
    }
}

/// A single tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError>;
}

/// Port for tool execution
///
/// This port defines how the application layer executes tools.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// The full catalog, for transmission to the provider
    fn definitions(&self) -> &ToolCatalog;

    /// Registered confirmation flag; `false` for unknown names
    fn requires_confirmation(&self, name: &str) -> bool {
        self.definitions().requires_confirmation(name)
    }

    /// Invoke the handler registered under `name`.
    ///
    /// Unknown names fail with a `TOOL_NOT_FOUND` [`ToolError`]. The handler's
    /// output or failure is returned verbatim.
    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError>;
}
