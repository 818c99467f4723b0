//! Pending action domain
//!
//! A confirmation-required tool call is never executed inline. It becomes a
//! [`PendingAction`] that the user approves or rejects, or that lapses after
//! its TTL.

pub mod enrichment;
pub mod entities;

pub use enrichment::{DisplayLookups, enrich_display_args};
pub use entities::{ActionStatus, DEFAULT_PENDING_TTL_MINUTES, PendingAction};
