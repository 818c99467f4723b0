//! Application layer for ledger-assistant
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DEFAULT_MAX_ROUNDS, EngineParams};
pub use ports::{
    clock::{Clock, ManualClock, SystemClock},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::ConversationRepository,
    entity_resolver::{EntityResolver, NoEntityResolver},
    llm_provider::{LlmProvider, ProviderError, ProviderStream},
    pending_action_store::PendingActionRepository,
    settings::{SettingsSource, StaticSettings},
    store_error::StoreError,
    tool_executor::{ToolContext, ToolExecutorPort, ToolHandler},
};
pub use use_cases::conversation_log::ConversationLog;
pub use use_cases::error::AssistantError;
pub use use_cases::pending_actions::PendingActionWorkflow;
pub use use_cases::provider_config::ProviderConfigCache;
pub use use_cases::run_assistant::{ApprovalOutcome, AssistantEngine, AssistantReply, ChatStream};
