// Anthropic Messages API provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::retry::{with_retry, RetryPolicy};
use super::sse::{truncated_stream_error, SseBuffer};
use super::types::{Message, ProviderRequest, ProviderResponse, StreamChunk};
use super::LlmProvider;
use crate::constitution::ModelInvocationError;

pub const CLAUDE_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Claude provider (Anthropic Messages API)
#[derive(Clone)]
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    retry: RetryPolicy,
}

impl ClaudeProvider {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: CLAUDE_API_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Custom endpoint (proxies, test servers). Trailing slashes are ignored.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn to_claude_request(&self, request: &ProviderRequest, stream: bool) -> ClaudeRequest {
        ClaudeRequest {
            model: request.model_or(&self.default_model).to_string(),
            max_tokens: request.max_tokens,
            messages: request.messages.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            stop_sequences: request.stop_sequences.clone(),
            stream,
        }
    }

    async fn post(&self, body: &ClaudeRequest) -> Result<reqwest::Response> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelInvocationError::Status {
                status: status.as_u16(),
                body: error_body,
            }
            .into());
        }

        Ok(response)
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.to_claude_request(request, false);
        tracing::debug!("Sending request to Claude API: {:?}", body);

        let claude_response: ClaudeResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| ModelInvocationError::Malformed(e.to_string()))
            .context("Failed to parse Claude API response")?;

        tracing::debug!("Received response: {:?}", claude_response);

        Ok(claude_response.into_provider_response())
    }

    /// Send a message with streaming response (no retry)
    async fn send_message_stream_once(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk>>> {
        let (tx, rx) = mpsc::channel(100);
        let body = self.to_claude_request(request, true);

        tracing::debug!("Sending streaming request to Claude API");
        let response = self.post(&body).await?;

        tokio::spawn(async move {
            tracing::debug!("[STREAM] Claude streaming task started");
            let mut stream = response.bytes_stream();
            let mut sse = SseBuffer::new();
            let mut stop_reason = None;
            let mut saw_stop = false;

            'read: while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!("Stream error: {}", e);
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };
                sse.extend(&bytes);

                while let Some(data) = sse.next_data() {
                    let event = match serde_json::from_str::<ClaudeStreamEvent>(&data) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::debug!("Skipping unparseable stream event: {}", e);
                            continue;
                        }
                    };

                    match event {
                        ClaudeStreamEvent::ContentBlockDelta {
                            delta: ClaudeDelta::TextDelta { text },
                        } => {
                            if tx.send(Ok(StreamChunk::TextDelta(text))).await.is_err() {
                                return;
                            }
                        }
                        ClaudeStreamEvent::MessageDelta { delta } => {
                            stop_reason = delta.stop_reason;
                        }
                        ClaudeStreamEvent::MessageStop => {
                            saw_stop = true;
                            break 'read;
                        }
                        ClaudeStreamEvent::Error { error } => {
                            let err = ModelInvocationError::Request(format!(
                                "{}: {}",
                                error.error_type, error.message
                            ));
                            let _ = tx.send(Err(err.into())).await;
                            return;
                        }
                        _ => {}
                    }
                }
            }

            if !saw_stop {
                let err = truncated_stream_error(&sse, "message_stop");
                tracing::warn!("Claude stream truncated: {}", err);
                let _ = tx.send(Err(err.into())).await;
                return;
            }

            let _ = tx.send(Ok(StreamChunk::Done { stop_reason })).await;
            tracing::debug!("[STREAM] Claude streaming task finished");
        });

        Ok(rx)
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.retry, || self.send_message_once(request)).await
    }

    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk>>> {
        with_retry(self.retry, || self.send_message_stream_once(request)).await
    }

    fn name(&self) -> &str {
        "claude"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Claude API types

#[derive(Debug, Clone, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    stream: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Deserialize)]
struct ClaudeResponse {
    id: String,
    model: String,
    content: Vec<ClaudeContentBlock>,
    stop_reason: Option<String>,
}

impl ClaudeResponse {
    fn into_provider_response(self) -> ProviderResponse {
        let text = self
            .content
            .iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
                ClaudeContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        ProviderResponse {
            id: self.id,
            model: self.model,
            text,
            stop_reason: self.stop_reason,
            provider: "claude".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    ContentBlockDelta { delta: ClaudeDelta },
    MessageDelta { delta: ClaudeMessageDelta },
    MessageStop,
    Error { error: ClaudeStreamError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
struct ClaudeMessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClaudeStreamError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
