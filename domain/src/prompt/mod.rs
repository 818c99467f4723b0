//! Prompt domain
//!
//! Templates for the system message sent on every turn.

mod template;

pub use template::PromptTemplate;
