//! Domain layer for ledger-assistant
//!
//! This crate contains the core business logic, entities, and value objects
//! of the conversational assistant. It has no dependencies on infrastructure
//! or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversation log
//!
//! Messages are append-only and totally ordered. Before each provider call
//! the log is passed through [`reconstruct_history`], which keeps every tool
//! result right after the assistant message that announced it and drops
//! orphans.
//!
//! ## Pending actions
//!
//! Tools flagged `requires_confirmation` never run inline. Each such call
//! becomes a [`PendingAction`] that is approved, rejected, or expires.

pub mod action;
pub mod chat;
pub mod conversation;
pub mod core;
pub mod prompt;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use action::{
    ActionStatus, DEFAULT_PENDING_TTL_MINUTES, DisplayLookups, PendingAction, enrich_display_args,
};
pub use chat::{ChatEvent, DoneReason, PendingActionSummary};
pub use conversation::{
    ChatMessage, Conversation, DEFAULT_TITLE, Message, MessageMetadata, MessageOptions, Role,
    reconstruct_history,
};
pub use core::{
    error::DomainError,
    ids::{ActionId, ConversationId, MessageId, UserId},
    string::truncate_chars,
};
pub use prompt::PromptTemplate;
pub use session::{ProviderConfig, ProviderConfigPatch, ProviderEvent};
pub use tool::{
    ArgumentsExt, DefaultToolValidator, ToolArguments, ToolCall, ToolCatalog, ToolDefinition,
    ToolError, ToolParameter, ToolResult, ToolValidator, arguments_from_value,
};
