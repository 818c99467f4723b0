//! Conversation domain module
//!
//! Conversations, the append-only message log, and the reconstruction that
//! turns the log into a provider-safe history.

pub mod entities;
pub mod reconstruction;

pub use entities::{
    ChatMessage, Conversation, DEFAULT_TITLE, Message, MessageMetadata, MessageOptions, Role,
    TITLE_MAX_CHARS, derive_title,
};
pub use reconstruction::reconstruct_history;
