//! Anthropic Messages API provider
//!
//! - [`adapter`]: HTTP client implementing the `LlmProvider` port
//! - [`types`]: wire types and neutral ↔ wire translation
//! - [`sse`]: streaming body decoding

pub mod adapter;
mod sse;
mod types;

pub use adapter::AnthropicProvider;
