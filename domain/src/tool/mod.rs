//! Tool domain module
//!
//! This module defines the core abstractions for the assistant's **Tool
//! System**: how the LLM operates the product (list tasks, create an invoice,
//! schedule a reminder) through structured calls.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolCatalog  │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (definitions)│    │ (provider id)│    │ (tool msg)   │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Confirmation
//!
//! Each [`ToolDefinition`] carries a `requires_confirmation` flag. Calls to a
//! confirmed tool are never executed inline: the engine turns them into a
//! pending action that the user approves or rejects later.
//!
//! | Tool | Confirmation |
//! |------|--------------|
//! | `listTasks`, `listReminders` | No (runs immediately) |
//! | `createInvoice`, `createReminder` | Yes (deferred) |
//!
//! # Architecture
//!
//! - **Domain** (this module): definitions, calls, results, validation
//! - **Application** (`ToolExecutorPort`, `ToolHandler`): execution contract
//! - **Infrastructure** (`ToolRegistry`): name → handler routing

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{
    ArgumentsExt, ToolArguments, ToolCall, ToolCatalog, ToolDefinition, ToolParameter,
    arguments_from_value,
};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolResult};
