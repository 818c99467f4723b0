//! Provider session domain
//!
//! Provider configuration and the neutral streaming event type exchanged
//! between the engine and the provider adapter.

pub mod config;
pub mod stream;

pub use config::{ProviderConfig, ProviderConfigPatch, redact};
pub use stream::ProviderEvent;
