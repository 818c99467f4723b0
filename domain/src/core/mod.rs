//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: identifier newtypes (users, conversations, messages, actions)
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: UTF-8 safe truncation

pub mod error;
pub mod ids;
pub mod string;
