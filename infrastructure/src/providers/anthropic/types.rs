//! Anthropic Messages API wire types and translation
//!
//! Converts between the neutral [`ChatMessage`] log and the Messages API
//! shape:
//!
//! | Neutral | Wire |
//! |---------|------|
//! | `system` | top-level `system` string |
//! | `user` | `user` message, `text` block |
//! | `assistant` | `assistant` message, `text` + `tool_use` blocks |
//! | `tool` | `user` message, `tool_result` block |
//!
//! Consecutive messages landing on the same wire role are merged, since the
//! API requires roles to alternate.

use ledger_application::ports::llm_provider::ProviderError;
use ledger_domain::{
    ChatMessage, MessageMetadata, ProviderConfig, Role, ToolCall, arguments_from_value,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl MessagesRequest {
    /// Translate the neutral history into a request body.
    pub fn build(
        messages: &[ChatMessage],
        tools: Vec<Value>,
        config: &ProviderConfig,
        stream: bool,
    ) -> Self {
        let (system, messages) = to_wire_messages(messages);
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system,
            messages,
            temperature: config.temperature,
            tools,
            stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block types this adapter does not use (e.g. `thinking`)
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Split off the system prompt and translate the rest, merging same-role runs.
pub(crate) fn to_wire_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<WireMessage>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut wire: Vec<WireMessage> = Vec::new();

    for message in messages {
        let (role, blocks) = match message.role {
            Role::System => {
                if !message.content.trim().is_empty() {
                    system_parts.push(&message.content);
                }
                continue;
            }
            Role::User => ("user", text_block(&message.content).into_iter().collect()),
            Role::Tool => (
                "user",
                vec![ContentBlock::ToolResult {
                    tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                    content: message.content.clone(),
                }],
            ),
            Role::Assistant => {
                let mut blocks: Vec<ContentBlock> =
                    text_block(&message.content).into_iter().collect();
                blocks.extend(message.tool_calls.iter().map(|call| ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: Value::Object(call.arguments.clone()),
                }));
                ("assistant", blocks)
            }
        };

        if blocks.is_empty() {
            continue;
        }
        match wire.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => wire.push(WireMessage {
                role: role.to_string(),
                content: blocks,
            }),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, wire)
}

fn text_block(content: &str) -> Option<ContentBlock> {
    if content.is_empty() {
        None
    } else {
        Some(ContentBlock::Text {
            text: content.to_string(),
        })
    }
}

/// Assemble the neutral assistant message from a non-streamed response.
pub(crate) fn from_response(response: MessagesResponse) -> Result<ChatMessage, ProviderError> {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text: part } => text.push_str(&part),
            ContentBlock::ToolUse { id, name, input } => {
                let arguments = arguments_from_value(input)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
                tool_calls.push(ToolCall::new(id, name).with_arguments(arguments));
            }
            ContentBlock::ToolResult { .. } | ContentBlock::Other => {}
        }
    }

    let metadata = MessageMetadata {
        model: Some(response.model),
        input_tokens: response.usage.input_tokens,
        output_tokens: response.usage.output_tokens,
        duration_ms: None,
    };
    Ok(ChatMessage::assistant_with_tools(text, tool_calls).with_metadata(metadata))
}

/// Map a non-success HTTP status and its body to a provider error.
pub(crate) fn status_error(status: u16, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| {
            if e.error.kind.is_empty() {
                e.error.message
            } else {
                format!("{}: {}", e.error.kind, e.error.message)
            }
        })
        .unwrap_or_else(|_| body.trim().to_string());
    let detail = format!("HTTP {}: {}", status, detail);

    match status {
        401 | 403 => ProviderError::AuthenticationError(detail),
        429 => ProviderError::RateLimited(detail),
        _ => ProviderError::RequestFailed(detail),
    }
}
