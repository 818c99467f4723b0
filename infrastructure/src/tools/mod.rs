//! Tool adapters
//!
//! The [`ToolRegistry`] routes calls by name to handlers. Two sample tool
//! families operate on an in-memory [`BusinessStore`]:
//!
//! - [`invoices`]: `listTasks`, `getTask`, `listInvoices`, `createInvoice`
//! - [`reminders`]: `listReminders`, `createReminder`

pub mod business_store;
pub mod invoices;
pub mod registry;
pub mod reminders;
pub mod schema;
mod validation;

pub use business_store::{BusinessStore, Invoice, NewInvoice, Reminder, Task};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::JsonSchemaToolConverter;
