//! Argument checks shared by the tool handlers.

use ledger_domain::{DefaultToolValidator, ToolArguments, ToolDefinition, ToolError, ToolValidator};
use serde::Serialize;
use serde_json::Value;

/// Check `args` against the handler's own definition.
pub(crate) fn validate_args(
    definition: &ToolDefinition,
    args: &ToolArguments,
) -> Result<(), ToolError> {
    DefaultToolValidator
        .validate(args, definition)
        .map_err(ToolError::invalid_argument)
}

/// Serialize a handler's output.
pub(crate) fn to_output<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::execution_failed(e.to_string()))
}
