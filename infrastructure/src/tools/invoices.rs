//! Invoice tool family
//!
//! | Tool | Confirmation | Description |
//! |------|--------------|-------------|
//! | `listTasks` | No | The user's billable tasks |
//! | `getTask` | No | One task by id |
//! | `listInvoices` | No | Issued invoices, optionally for one task |
//! | `createInvoice` | Yes | Issue a draft invoice for a task |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ledger_application::ports::tool_executor::{ToolContext, ToolHandler};
use ledger_domain::{ArgumentsExt, ToolArguments, ToolDefinition, ToolError, ToolParameter};
use serde_json::{Value, json};

use super::business_store::{BusinessStore, NewInvoice};
use super::registry::ToolRegistryBuilder;
use super::validation::{to_output, validate_args};

pub const LIST_TASKS: &str = "listTasks";
pub const GET_TASK: &str = "getTask";
pub const LIST_INVOICES: &str = "listInvoices";
pub const CREATE_INVOICE: &str = "createInvoice";

pub fn list_tasks_definition() -> ToolDefinition {
    ToolDefinition::new(
        LIST_TASKS,
        "List the user's billable tasks with client, hourly rate and logged hours.",
    )
    .with_parameter(ToolParameter::new(
        "client",
        "Only tasks for this client (case-insensitive)",
        false,
    ))
}

pub fn get_task_definition() -> ToolDefinition {
    ToolDefinition::new(GET_TASK, "Get one task by id.")
        .with_parameter(ToolParameter::new("taskId", "Task id", true))
}

pub fn list_invoices_definition() -> ToolDefinition {
    ToolDefinition::new(LIST_INVOICES, "List invoices issued by the user.")
        .with_parameter(ToolParameter::new("taskId", "Only invoices for this task", false))
}

pub fn create_invoice_definition() -> ToolDefinition {
    ToolDefinition::new(
        CREATE_INVOICE,
        "Issue a draft invoice for a task. Hours and rate default to the task's \
         logged hours and hourly rate.",
    )
    .with_parameter(ToolParameter::new("taskId", "Task to bill", true))
    .with_parameter(ToolParameter::new("hours", "Hours to bill", false).with_type("number"))
    .with_parameter(ToolParameter::new("rate", "Hourly rate", false).with_type("number"))
    .with_parameter(
        ToolParameter::new("month", "Billing month (1-12)", false).with_type("integer"),
    )
    .with_parameter(ToolParameter::new("year", "Billing year", false).with_type("integer"))
    .confirmed()
}

impl ToolRegistryBuilder {
    /// Register `listTasks`, `getTask`, `listInvoices` and `createInvoice`.
    pub fn register_invoice_tools(self, store: Arc<BusinessStore>) -> Self {
        self.register(
            list_tasks_definition(),
            ListTasks {
                store: store.clone(),
                definition: list_tasks_definition(),
            },
        )
        .register(
            get_task_definition(),
            GetTask {
                store: store.clone(),
                definition: get_task_definition(),
            },
        )
        .register(
            list_invoices_definition(),
            ListInvoices {
                store: store.clone(),
                definition: list_invoices_definition(),
            },
        )
        .register(
            create_invoice_definition(),
            CreateInvoice {
                store,
                definition: create_invoice_definition(),
            },
        )
    }
}

struct ListTasks {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for ListTasks {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let client = args.get_str("client").map(str::to_lowercase);

        let tasks: Vec<_> = self
            .store
            .tasks(&context.user_id)
            .await
            .into_iter()
            .filter(|t| {
                client
                    .as_deref()
                    .is_none_or(|c| t.client.to_lowercase() == c)
            })
            .collect();
        to_output(&tasks)
    }
}

struct GetTask {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for GetTask {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let task_id = args.require_str("taskId").map_err(ToolError::invalid_argument)?;
        let task = self
            .store
            .task(&context.user_id, task_id)
            .await
            .ok_or_else(|| ToolError::not_found(format!("task {}", task_id)))?;
        to_output(&task)
    }
}

struct ListInvoices {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for ListInvoices {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let task_id = args.get_str("taskId");
        let invoices: Vec<_> = self
            .store
            .invoices(&context.user_id)
            .await
            .into_iter()
            .filter(|i| task_id.is_none_or(|id| i.task_id == id))
            .collect();
        to_output(&invoices)
    }
}

struct CreateInvoice {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for CreateInvoice {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let task_id = args.require_str("taskId").map_err(ToolError::invalid_argument)?;
        let task = self
            .store
            .task(&context.user_id, task_id)
            .await
            .ok_or_else(|| ToolError::not_found(format!("task {}", task_id)))?;

        let hours = args.get_f64("hours").unwrap_or(task.logged_hours);
        let rate = args.get_f64("rate").unwrap_or(task.hourly_rate);
        if hours <= 0.0 {
            return Err(ToolError::invalid_argument("hours must be positive"));
        }
        if rate < 0.0 {
            return Err(ToolError::invalid_argument("rate must not be negative"));
        }

        let month = match args.get_i64("month") {
            Some(m @ 1..=12) => Some(m as u32),
            Some(other) => {
                return Err(ToolError::invalid_argument(format!(
                    "month must be between 1 and 12, got {}",
                    other
                )));
            }
            None => None,
        };
        let year = args.get_i64("year").and_then(|y| i32::try_from(y).ok());

        let new = NewInvoice {
            task_id: task.id.clone(),
            hours,
            rate,
            month,
            year,
        };
        let invoice = self
            .store
            .create_invoice(&context.user_id, new, Utc::now())
            .await
            .ok_or_else(|| ToolError::not_found(format!("task {}", task.id)))?;

        tracing::info!(
            invoice = %invoice.id,
            task = %task.id,
            total = invoice.total,
            "Invoice created"
        );
        Ok(json!({
            "invoiceId": invoice.id,
            "invoice": to_output(&invoice)?,
        }))
    }
}
