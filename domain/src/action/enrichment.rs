//! Display enrichment for confirmation prompts
//!
//! Raw tool arguments are machine-oriented (`taskId: "t1"`, `month: 1`). Before
//! a confirmation-required call is shown to the user, a copy of its arguments
//! gains readable fields. The copy is presentation only and is never executed.

use crate::tool::entities::{ArgumentsExt, ToolArguments};
use serde_json::Value;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Values looked up outside the domain (e.g. from the business store).
#[derive(Debug, Clone, Default)]
pub struct DisplayLookups {
    /// Display name of the task referenced by `taskId`, when it resolved.
    pub task_name: Option<String>,
}

impl DisplayLookups {
    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }
}

/// Readable copy of `args`.
///
/// | Input | Added field |
/// |-------|-------------|
/// | `taskId` + resolved name | `taskName` |
/// | `rate` and `hours` | `total` (rounded to cents) |
/// | `month` (1-12) and `year` | `period` ("January 2025") |
///
/// Existing keys are never overwritten.
pub fn enrich_display_args(args: &ToolArguments, lookups: &DisplayLookups) -> ToolArguments {
    let mut display = args.clone();

    if args.contains_key("taskId")
        && let Some(name) = &lookups.task_name
    {
        display
            .entry("taskName")
            .or_insert_with(|| Value::String(name.clone()));
    }

    if let (Some(rate), Some(hours)) = (args.get_f64("rate"), args.get_f64("hours")) {
        let total = (rate * hours * 100.0).round() / 100.0;
        if let Some(number) = serde_json::Number::from_f64(total) {
            display.entry("total").or_insert(Value::Number(number));
        }
    }

    if let Some(period) = readable_period(args) {
        display.entry("period").or_insert(Value::String(period));
    }

    display
}

fn readable_period(args: &ToolArguments) -> Option<String> {
    let month = args.get_i64("month")?;
    let year = args.get_i64("year")?;
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    let name = MONTH_NAMES.get(index)?;
    Some(format!("{} {}", name, year))
}
