//! Anthropic provider adapter
//!
//! Implements [`LlmProvider`] over `POST {base_url}/v1/messages`.
//!
//! ## Authentication
//! - Header: `x-api-key: {api_key}`
//! - Header: `anthropic-version: {api_version}`
//!
//! Streaming requests set `stream: true`; the response body is decoded on a
//! spawned task that forwards neutral events through a bounded channel.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use ledger_application::ports::llm_provider::{LlmProvider, ProviderError, ProviderStream};
use ledger_domain::{ChatMessage, ProviderConfig, ProviderEvent, ToolCatalog};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::sse::{SseDecoder, StreamAssembler};
use super::types::{self, MessagesRequest, MessagesResponse};
use crate::tools::JsonSchemaToolConverter;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const STREAM_BUFFER: usize = 64;

/// Anthropic Messages API client.
///
/// Holds only the HTTP client; credentials and model come with each call, so
/// a settings change takes effect on the next turn.
pub struct AnthropicProvider {
    client: Client,
}

impl AnthropicProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn endpoint(config: &ProviderConfig) -> String {
        format!("{}/v1/messages", config.base_url.trim_end_matches('/'))
    }

    fn request(
        messages: &[ChatMessage],
        tools: &ToolCatalog,
        config: &ProviderConfig,
        stream: bool,
    ) -> MessagesRequest {
        let schemas = JsonSchemaToolConverter.all_tools_schema(tools);
        MessagesRequest::build(messages, schemas, config, stream)
    }

    /// Send a request and fail on any non-success status.
    async fn send(
        &self,
        body: &MessagesRequest,
        config: &ProviderConfig,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, ProviderError> {
        if !config.has_api_key() {
            return Err(ProviderError::Configuration("API key is not set".to_string()));
        }

        let url = Self::endpoint(config);
        debug!(
            url = %url,
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream = body.stream,
            "Sending Anthropic request"
        );

        let mut request = self
            .client
            .post(&url)
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", &config.api_version)
            .header("content-type", "application/json")
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = types::status_error(status.as_u16(), &text);
            warn!(status = status.as_u16(), error = %error, "Anthropic request rejected");
            return Err(error);
        }
        Ok(response)
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &ToolCatalog,
        config: &ProviderConfig,
    ) -> Result<ChatMessage, ProviderError> {
        let started = Instant::now();
        let body = Self::request(messages, tools, config, false);
        let response = self.send(&body, config, Some(REQUEST_TIMEOUT)).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let stop_reason = parsed.stop_reason.clone();

        let mut message = types::from_response(parsed)?;
        if let Some(metadata) = message.metadata.as_mut() {
            metadata.duration_ms = Some(started.elapsed().as_millis() as u64);
        }
        info!(
            stop_reason = stop_reason.as_deref().unwrap_or("none"),
            tool_calls = message.tool_calls.len(),
            "Anthropic turn complete"
        );
        Ok(message)
    }

    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        tools: &ToolCatalog,
        config: &ProviderConfig,
    ) -> Result<ProviderStream, ProviderError> {
        let started = Instant::now();
        let body = Self::request(messages, tools, config, true);
        let response = self.send(&body, config, None).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut assembler = StreamAssembler::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(ProviderEvent::Error(format!("Stream interrupted: {}", e)))
                            .await;
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    if !forward(&tx, assembler.handle(&data), started).await {
                        return;
                    }
                }
            }

            if let Some(data) = decoder.finish()
                && !forward(&tx, assembler.handle(&data), started).await
            {
                return;
            }

            let _ = tx
                .send(ProviderEvent::Error(
                    "Stream ended before message_stop".to_string(),
                ))
                .await;
        });

        Ok(ProviderStream::new(rx))
    }

    async fn validate_config(&self, config: &ProviderConfig) -> bool {
        let probe = ProviderConfig {
            max_tokens: 1,
            ..config.clone()
        };
        let body = MessagesRequest::build(&[ChatMessage::user("ping")], Vec::new(), &probe, false);
        match self.send(&body, &probe, Some(CONNECT_TIMEOUT * 3)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Provider config validation failed");
                false
            }
        }
    }
}

/// Forward assembled events. Returns `false` once the turn is over or the
/// receiver is gone.
async fn forward(
    tx: &mpsc::Sender<ProviderEvent>,
    events: Vec<ProviderEvent>,
    started: Instant,
) -> bool {
    for mut event in events {
        if let ProviderEvent::Done { metadata, .. } = &mut event {
            metadata.duration_ms = Some(started.elapsed().as_millis() as u64);
        }
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            debug!("Stream consumer dropped; abandoning provider stream");
            return false;
        }
        if terminal {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::{ToolCall, ToolDefinition};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    fn catalog() -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.insert(ToolDefinition::new("listTasks", "List tasks"));
        catalog
    }

    #[tokio::test]
    async fn test_chat_sends_headers_and_parses_reply() {
        let (base_url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"id":"msg_1","model":"claude-test","stop_reason":"tool_use","content":[{"type":"tool_use","id":"toolu_1","name":"listTasks","input":{}}],"usage":{"input_tokens":10,"output_tokens":5}}"#,
        )
        .await;
        let config = ProviderConfig::new("sk-test").with_base_url(base_url);

        let reply = AnthropicProvider::new()
            .chat(&[ChatMessage::system("sys"), ChatMessage::user("hi")], &catalog(), &config)
            .await
            .unwrap();
        assert_eq!(reply.tool_calls, vec![ToolCall::new("toolu_1", "listTasks")]);
        assert!(reply.metadata.unwrap().duration_ms.is_some());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/messages"));
        assert!(request.contains("x-api-key: sk-test"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains(r#""system":"sys""#));
        assert!(request.contains(r#""name":"listTasks""#));
    }

    #[tokio::test]
    async fn test_stream_chat_emits_events() {
        let (base_url, _server) = serve_once(
            "200 OK",
            "text/event-stream",
            concat!(
                "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"model\":\"claude-test\",\"usage\":{\"input_tokens\":3}}}\n\n",
                "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
                "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
            ),
        )
        .await;
        let config = ProviderConfig::new("sk-test").with_base_url(base_url);

        let message = AnthropicProvider::new()
            .stream_chat(&[ChatMessage::user("hi")], &ToolCatalog::new(), &config)
            .await
            .unwrap()
            .collect_message()
            .await
            .unwrap();
        assert_eq!(message.content, "Hello");
        assert_eq!(message.metadata.unwrap().input_tokens, Some(3));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_error() {
        let (base_url, _server) = serve_once(
            "200 OK",
            "text/event-stream",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n",
        )
        .await;
        let config = ProviderConfig::new("sk-test").with_base_url(base_url);

        let err = AnthropicProvider::new()
            .stream_chat(&[ChatMessage::user("hi")], &ToolCatalog::new(), &config)
            .await
            .unwrap()
            .collect_message()
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RequestFailed(msg) if msg.contains("message_stop")));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error_and_invalid_config() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let (base_url, _server) = serve_once("401 Unauthorized", "application/json", body).await;
        let config = ProviderConfig::new("sk-bad").with_base_url(base_url);
        let err = AnthropicProvider::new()
            .chat(&[ChatMessage::user("hi")], &ToolCatalog::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationError(_)));

        let (base_url, _server) = serve_once("401 Unauthorized", "application/json", body).await;
        let config = ProviderConfig::new("sk-bad").with_base_url(base_url);
        assert!(!AnthropicProvider::new().validate_config(&config).await);
    }

    #[tokio::test]
    async fn test_missing_key_and_unreachable_host() {
        let provider = AnthropicProvider::new();
        let err = provider
            .chat(&[ChatMessage::user("hi")], &ToolCatalog::new(), &ProviderConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(!provider.validate_config(&ProviderConfig::default()).await);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let config = ProviderConfig::new("sk-test").with_base_url(base_url);
        let err = provider
            .chat(&[ChatMessage::user("hi")], &ToolCatalog::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ConnectionError(_)));
    }
}
