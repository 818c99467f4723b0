//! Tool domain traits
//!
//! Contains pure domain logic traits for tool argument validation.
//! The async handler and executor traits live in the application layer (ports).

use super::entities::{ToolArguments, ToolDefinition};
use serde_json::Value;

/// Validator for tool arguments
///
/// This is a pure domain trait that checks an argument payload
/// against its definition without any I/O operations.
pub trait ToolValidator {
    /// Validate arguments against a tool definition
    fn validate(&self, arguments: &ToolArguments, definition: &ToolDefinition)
    -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Checks required keys, rejects unknown keys, and checks JSON types and
/// enumerations for the keys that are present.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(
        &self,
        arguments: &ToolArguments,
        definition: &ToolDefinition,
    ) -> Result<(), String> {
        for param in definition.required_parameters() {
            match arguments.get(&param.name) {
                None | Some(Value::Null) => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, definition.name
                    ));
                }
                Some(_) => {}
            }
        }

        for (key, value) in arguments {
            let Some(param) = definition.parameters.iter().find(|p| &p.name == key) else {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    key, definition.name
                ));
            };

            if value.is_null() {
                continue;
            }

            let type_ok = match param.param_type.as_str() {
                "number" => {
                    value.is_number() || value.as_str().is_some_and(|s| s.parse::<f64>().is_ok())
                }
                "integer" => {
                    value.is_i64()
                        || value.is_u64()
                        || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
                }
                "boolean" => value.is_boolean(),
                _ => value.is_string(),
            };
            if !type_ok {
                return Err(format!(
                    "Parameter '{}' for tool '{}' must be of type {}",
                    key, definition.name, param.param_type
                ));
            }

            if !param.allowed_values.is_empty()
                && let Some(s) = value.as_str()
                && !param.allowed_values.iter().any(|v| v == s)
            {
                return Err(format!(
                    "Parameter '{}' must be one of: {}",
                    key,
                    param.allowed_values.join(", ")
                ));
            }
        }

        Ok(())
    }
}
