//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid action status: {0}")]
    InvalidActionStatus(String),

    #[error("Illegal action transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Tool arguments must be a JSON object, got {0}")]
    ArgumentsNotAnObject(String),
}
