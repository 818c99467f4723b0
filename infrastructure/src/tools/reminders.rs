//! Reminder tool family

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use ledger_application::ports::tool_executor::{ToolContext, ToolHandler};
use ledger_domain::{ArgumentsExt, ToolArguments, ToolDefinition, ToolError, ToolParameter};
use serde_json::{Value, json};

use super::business_store::BusinessStore;
use super::registry::ToolRegistryBuilder;
use super::validation::{to_output, validate_args};

pub const LIST_REMINDERS: &str = "listReminders";
pub const CREATE_REMINDER: &str = "createReminder";

pub fn list_reminders_definition() -> ToolDefinition {
    ToolDefinition::new(LIST_REMINDERS, "List the user's reminders, soonest first.").with_parameter(
        ToolParameter::new("from", "Only reminders due on or after this date (YYYY-MM-DD)", false),
    )
}

pub fn create_reminder_definition() -> ToolDefinition {
    ToolDefinition::new(CREATE_REMINDER, "Schedule a reminder for the user.")
        .with_parameter(ToolParameter::new("title", "What to be reminded about", true))
        .with_parameter(ToolParameter::new("dueDate", "Due date (YYYY-MM-DD)", true))
        .with_parameter(ToolParameter::new("note", "Optional details", false))
        .confirmed()
}

impl ToolRegistryBuilder {
    /// Register `listReminders` and `createReminder`.
    pub fn register_reminder_tools(self, store: Arc<BusinessStore>) -> Self {
        self.register(
            list_reminders_definition(),
            ListReminders {
                store: store.clone(),
                definition: list_reminders_definition(),
            },
        )
        .register(
            create_reminder_definition(),
            CreateReminder {
                store,
                definition: create_reminder_definition(),
            },
        )
    }
}

fn parse_date(args: &ToolArguments, key: &str) -> Result<Option<NaiveDate>, ToolError> {
    args.get_str(key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                ToolError::invalid_argument(format!(
                    "{} must be a YYYY-MM-DD date, got '{}'",
                    key, raw
                ))
            })
        })
        .transpose()
}

struct ListReminders {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for ListReminders {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let from = parse_date(args, "from")?;
        let reminders: Vec<_> = self
            .store
            .reminders(&context.user_id)
            .await
            .into_iter()
            .filter(|r| from.is_none_or(|d| r.due_date >= d))
            .collect();
        to_output(&reminders)
    }
}

struct CreateReminder {
    store: Arc<BusinessStore>,
    definition: ToolDefinition,
}

#[async_trait]
impl ToolHandler for CreateReminder {
    async fn execute(
        &self,
        args: &ToolArguments,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        validate_args(&self.definition, args)?;
        let title = args.require_str("title").map_err(ToolError::invalid_argument)?.trim();
        if title.is_empty() {
            return Err(ToolError::invalid_argument("title must not be empty"));
        }
        let due_date = parse_date(args, "dueDate")?
            .ok_or_else(|| ToolError::invalid_argument("Missing required argument: dueDate"))?;
        let note = args.get_str("note").map(str::to_string);

        let reminder = self
            .store
            .create_reminder(&context.user_id, title, due_date, note, Utc::now())
            .await;
        tracing::info!(reminder = %reminder.id, due = %reminder.due_date, "Reminder created");
        Ok(json!({
            "reminderId": reminder.id,
            "reminder": to_output(&reminder)?,
        }))
    }
}
