//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod clock;
pub mod conversation_logger;
pub mod conversation_store;
pub mod entity_resolver;
pub mod llm_provider;
pub mod pending_action_store;
pub mod settings;
pub mod store_error;
pub mod tool_executor;
