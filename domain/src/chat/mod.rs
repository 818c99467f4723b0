//! Caller-facing chat events

pub mod event;

pub use event::{ChatEvent, DoneReason, PendingActionSummary};
