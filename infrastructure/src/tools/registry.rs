//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to their definition and handler and
//! implements [`ToolExecutorPort`]. It is assembled once at startup through a
//! [`ToolRegistryBuilder`] and never changes afterwards.
//!
//! # Usage
//!
//! ```ignore
//! use ledger_infrastructure::tools::{BusinessStore, ToolRegistry};
//!
//! let store = Arc::new(BusinessStore::with_sample_data());
//! let registry = ToolRegistry::builder()
//!     .register_invoice_tools(store.clone())
//!     .register_reminder_tools(store)
//!     .build();
//!
//! assert!(registry.requires_confirmation("createInvoice"));
//! let tasks = registry.execute("listTasks", &args, &context).await?;
//! ```
//!
//! # Conflicts
//!
//! Registering a name twice keeps the last registration, both for the
//! definition sent to the provider and for the handler that runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ledger_application::ports::tool_executor::{ToolContext, ToolExecutorPort, ToolHandler};
use ledger_domain::{ToolArguments, ToolCatalog, ToolDefinition, ToolError};
use serde_json::Value;

/// Collects tool registrations before freezing them into a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    catalog: ToolCatalog,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition with its handler
    pub fn register<H: ToolHandler + 'static>(
        self,
        definition: ToolDefinition,
        handler: H,
    ) -> Self {
        self.register_arc(definition, Arc::new(handler))
    }

    /// Register a tool definition with its handler (Arc version)
    pub fn register_arc(
        mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        if self.handlers.contains_key(&definition.name) {
            tracing::debug!(tool = %definition.name, "Replacing previously registered tool");
        }
        self.handlers.insert(definition.name.clone(), handler);
        self.catalog.insert(definition);
        self
    }

    pub fn build(self) -> ToolRegistry {
        tracing::debug!(tools = self.catalog.len(), "Tool registry built");
        ToolRegistry {
            catalog: self.catalog,
            handlers: self.handlers,
        }
    }
}

/// Immutable name → (definition, handler) table
pub struct ToolRegistry {
    catalog: ToolCatalog,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        self.catalog.names().collect()
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn definitions(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(name) else {
            tracing::warn!(tool = name, "Call to unregistered tool");
            return Err(ToolError::tool_not_found(name));
        };

        tracing::debug!(
            tool = name,
            user = %context.user_id,
            conversation = %context.conversation_id,
            "Dispatching tool call"
        );
        handler.execute(args, context).await
    }
}
