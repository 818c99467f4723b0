//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod conversation_log;
pub mod error;
pub mod pending_actions;
pub mod provider_config;
pub mod run_assistant;
