//! Persistence adapters

pub mod memory;

pub use memory::{InMemoryConversationStore, InMemoryPendingActionStore};
