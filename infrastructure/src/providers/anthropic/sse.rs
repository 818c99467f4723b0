//! Server-Sent Events decoding for the streaming Messages API
//!
//! Two stages:
//!
//! 1. [`SseDecoder`] turns raw body chunks into complete `data:` payloads. A
//!    frame may be split anywhere across network chunks, including inside a
//!    UTF-8 sequence, so bytes are buffered until a full line arrives.
//! 2. [`StreamAssembler`] turns Anthropic stream events into neutral
//!    [`ProviderEvent`]s. Text is forwarded as it arrives; tool-call argument
//!    JSON is accumulated per content block and announced on
//!    `content_block_stop`.

use std::collections::HashMap;

use ledger_domain::{MessageMetadata, ProviderEvent, ToolCall, arguments_from_value};
use serde::Deserialize;
use serde_json::Value;

/// Incremental SSE frame decoder.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk; returns the payloads of every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.accept_line(&line) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flush a final frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(payload) = self.accept_line(&line) {
                return Some(payload);
            }
        }
        self.dispatch()
    }

    fn accept_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(data) = line.strip_prefix("data:") {
            self.data_lines
                .push(data.strip_prefix(' ').unwrap_or(data).to_string());
        }
        // `event:`, `id:`, `retry:` and `:` comments carry nothing we need;
        // every data payload names its own type.
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data_lines).join("\n"))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartMessage,
    },
    ContentBlockStart {
        index: usize,
        content_block: StartBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: StreamError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct StartMessage {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<DeltaUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeltaUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    json: String,
}

/// Per-turn state turning Anthropic stream events into [`ProviderEvent`]s.
#[derive(Debug, Default)]
pub(crate) struct StreamAssembler {
    tool_blocks: HashMap<usize, PendingToolUse>,
    metadata: MessageMetadata,
    stop_reason: Option<String>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one `data:` payload.
    pub fn handle(&mut self, data: &str) -> Vec<ProviderEvent> {
        let event: StreamEvent = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                return vec![ProviderEvent::Error(format!(
                    "Malformed stream event: {}",
                    e
                ))];
            }
        };

        match event {
            StreamEvent::MessageStart { message } => {
                self.metadata.model = message.model;
                if let Some(usage) = message.usage {
                    self.metadata.input_tokens = usage.input_tokens;
                }
                Vec::new()
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                StartBlock::Text { text } if !text.is_empty() => {
                    vec![ProviderEvent::TextDelta(text)]
                }
                StartBlock::ToolUse { id, name, input } => {
                    // The API normally sends `{}` here and the real input as deltas
                    let json = match input {
                        Value::Object(map) if !map.is_empty() => Value::Object(map).to_string(),
                        _ => String::new(),
                    };
                    self.tool_blocks
                        .insert(index, PendingToolUse { id, name, json });
                    Vec::new()
                }
                _ => Vec::new(),
            },
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } if !text.is_empty() => {
                    vec![ProviderEvent::TextDelta(text)]
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(block) = self.tool_blocks.get_mut(&index) {
                        block.json.push_str(&partial_json);
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            },
            StreamEvent::ContentBlockStop { index } => match self.tool_blocks.remove(&index) {
                Some(block) => vec![Self::finish_tool_use(block)],
                None => Vec::new(),
            },
            StreamEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                if let Some(usage) = usage
                    && usage.output_tokens.is_some()
                {
                    self.metadata.output_tokens = usage.output_tokens;
                }
                Vec::new()
            }
            StreamEvent::MessageStop => vec![ProviderEvent::Done {
                stop_reason: self.stop_reason.take(),
                metadata: std::mem::take(&mut self.metadata),
            }],
            StreamEvent::Error { error } => {
                let message = if error.kind.is_empty() {
                    error.message
                } else {
                    format!("{}: {}", error.kind, error.message)
                };
                vec![ProviderEvent::Error(message)]
            }
            StreamEvent::Ping | StreamEvent::Unknown => Vec::new(),
        }
    }

    fn finish_tool_use(block: PendingToolUse) -> ProviderEvent {
        let raw = if block.json.trim().is_empty() {
            "{}"
        } else {
            block.json.as_str()
        };
        let parsed = serde_json::from_str::<Value>(raw)
            .map_err(|e| e.to_string())
            .and_then(|value| arguments_from_value(value).map_err(|e| e.to_string()));

        match parsed {
            Ok(arguments) => ProviderEvent::ToolCall(
                ToolCall::new(block.id, block.name).with_arguments(arguments),
            ),
            Err(e) => ProviderEvent::Error(format!(
                "Invalid arguments for tool '{}': {}",
                block.name, e
            )),
        }
    }
}
