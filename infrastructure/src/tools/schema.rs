//! JSON Schema tool converter.
//!
//! Produces the provider-neutral JSON Schema form of a [`ToolCatalog`], which
//! the Anthropic adapter sends as the request's `tools` array.

use ledger_domain::{ToolCatalog, ToolDefinition};
use serde_json::{Map, Value, json};

/// Converts tool definitions into JSON Schema.
///
/// Handles param_type → JSON Schema type mapping:
/// - `"number"` → `"number"`
/// - `"integer"` → `"integer"`
/// - `"boolean"` → `"boolean"`
/// - anything else → `"string"`
///
/// Enumerated parameters also carry an `enum` list.
pub struct JsonSchemaToolConverter;

impl JsonSchemaToolConverter {
    pub fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            let schema_type = match param.param_type.as_str() {
                "number" => "number",
                "integer" => "integer",
                "boolean" => "boolean",
                _ => "string",
            };

            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(schema_type));
            prop.insert("description".to_string(), json!(param.description));
            if !param.allowed_values.is_empty() {
                prop.insert("enum".to_string(), json!(param.allowed_values));
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }

    /// Every tool in the catalog, sorted by name.
    pub fn all_tools_schema(&self, catalog: &ToolCatalog) -> Vec<Value> {
        catalog.all().map(|t| self.tool_to_schema(t)).collect()
    }
}
