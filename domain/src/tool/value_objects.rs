//! Tool domain value objects: immutable result and error types
//!
//! These types form the **output side** of the tool pipeline. A handler
//! either produces a JSON value or a [`ToolError`]; both are folded into a
//! [`ToolResult`] whose [`content`](ToolResult::content) is what gets stored
//! as the `tool` message and fed back to the provider.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Error that occurred during tool execution.
///
/// | Code | Description |
/// |------|-------------|
/// | `TOOL_NOT_FOUND` | No handler is registered under the requested name |
/// | `NOT_FOUND` | A referenced record does not exist |
/// | `INVALID_ARGUMENT` | Missing or malformed parameters |
/// | `EXECUTION_FAILED` | The handler failed while running |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "INVALID_ARGUMENT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Not found: {}", resource.into()))
    }

    pub fn tool_not_found(name: &str) -> Self {
        Self::new("TOOL_NOT_FOUND", format!("Tool not found: {}", name))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Outcome of one executed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Correlation id of the call this answers
    pub tool_call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Handler output (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error information (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Wall-clock time spent in the handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: true,
            output: Some(output),
            error: None,
            duration_ms: None,
        }
    }

    /// Create a failed result
    pub fn failure(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: ToolError,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error),
            duration_ms: None,
        }
    }

    /// Fold a handler's return value into a result.
    pub fn from_handler(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        outcome: Result<Value, ToolError>,
    ) -> Self {
        match outcome {
            Ok(value) => Self::success(tool_call_id, tool_name, value),
            Err(error) => Self::failure(tool_call_id, tool_name, error),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// JSON payload describing the outcome: the handler output, or an
    /// `{"error", "code"}` object.
    pub fn payload(&self) -> Value {
        match (&self.output, &self.error) {
            (Some(output), _) if self.success => output.clone(),
            (_, Some(error)) => json!({
                "error": error.message,
                "code": error.code,
            }),
            _ => Value::Null,
        }
    }

    /// JSON-encoded payload, stored as the `tool` message content.
    pub fn content(&self) -> String {
        self.payload().to_string()
    }
}
