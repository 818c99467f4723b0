//! Infrastructure layer for ledger-assistant
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the Anthropic provider, in-memory stores, the
//! tool registry with its sample tool families, configuration file loading
//! and JSONL transcript logging.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, FileAssistantConfig, FileConfig, FileProviderConfig,
    FileSettingsSource, Severity,
};
pub use logging::JsonlConversationLogger;
pub use persistence::{InMemoryConversationStore, InMemoryPendingActionStore};
pub use providers::AnthropicProvider;
pub use tools::{BusinessStore, JsonSchemaToolConverter, ToolRegistry, ToolRegistryBuilder};
