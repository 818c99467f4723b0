//! Application-level configuration.
//!
//! - [`EngineParams`]: round cap, pending-action TTL, stream buffering

pub mod engine_params;

pub use engine_params::{DEFAULT_MAX_ROUNDS, EngineParams};
