//! Prompt templates for the assistant

use crate::tool::entities::ToolCatalog;
use chrono::NaiveDate;

/// Templates for the assistant's system and bookkeeping messages
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for one turn, dated `today` (UTC).
    pub fn system(today: NaiveDate, catalog: &ToolCatalog) -> String {
        let mut prompt = format!(
            r#"You are the assistant of a business management application for freelancers and small companies.
You help the user with invoicing, tasks, expenses, income and reminders.
Today's date is {}.

Use the available tools to read or change the user's data instead of guessing.
Be concise. Amounts are in the user's currency unless stated otherwise."#,
            today.format("%Y-%m-%d")
        );

        let confirmed: Vec<&str> = catalog
            .all()
            .filter(|t| t.requires_confirmation)
            .map(|t| t.name.as_str())
            .collect();
        if !confirmed.is_empty() {
            prompt.push_str(&format!(
                r#"

The following tools change data and are queued for the user's confirmation instead of running immediately: {}.
When you call one, tell the user the action is waiting for their approval. Do not claim it has been done."#,
                confirmed.join(", ")
            ));
        }

        prompt
    }

    /// Message stored as the tool result of a call that was deferred.
    pub fn awaiting_confirmation(tool_name: &str) -> String {
        format!(
            "The {} action has been prepared and is awaiting the user's confirmation.",
            tool_name
        )
    }
}
