// OpenAI-compatible chat completions provider
//
// Works for OpenAI and any endpoint that speaks the same API (Groq, Mistral,
// local gateways) via a custom base URL.

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

pub const OPENAI_API_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI API provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    provider_name: String,
    retry: RetryPolicy,
}

impl OpenAIProvider {
    pub fn new_openai(api_key: String) -> Result<Self> {
        Self::new(
            api_key,
            OPENAI_API_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            "openai".to_string(),
        )
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn new(
        api_key: String,
        base_url: String,
        default_model: String,
        provider_name: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            default_model,
            provider_name,
            retry: RetryPolicy::default(),
        })
    }

    /// Convert ProviderRequest to OpenAI API format
    fn to_openai_request(&self, request: &ProviderRequest, stream: bool) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        // System prompt goes first as a {"role":"system"} message
        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().cloned());

        if request.top_k.is_some() {
            tracing::debug!("top_k is not supported by the OpenAI API, ignoring");
        }

        OpenAIRequest {
            model: request.model_or(&self.default_model).to_string(),
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            top_p: request.top_p,
            stop: request.stop_sequences.clone(),
            stream,
        }
    }

    fn from_openai_response(&self, response: OpenAIResponse) -> Result<ProviderResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelInvocationError::Malformed("no choices in response".to_string()))
            .context("OpenAI returned no choices in response")?;

        Ok(ProviderResponse {
            id: response.id,
            model: response.model,
            text: choice.message.content.unwrap_or_default(),
            stop_reason: choice.finish_reason,
            provider: self.provider_name.clone(),
        })
    }

    async fn post(&self, body: &OpenAIRequest) -> Result<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

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
        let body = self.to_openai_request(request, false);
        tracing::debug!("Sending request to OpenAI API: {:?}", body);

        let openai_response: OpenAIResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| ModelInvocationError::Malformed(e.to_string()))
            .context("Failed to parse OpenAI API response")?;

        tracing::debug!("Received response: {:?}", openai_response);

        self.from_openai_response(openai_response)
    }

    /// Send a message with streaming response (no retry)
    async fn send_message_stream_once(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk>>> {
        let (tx, rx) = mpsc::channel(100);
        let body = self.to_openai_request(request, true);

        tracing::debug!("Sending streaming request to OpenAI API");
        let response = self.post(&body).await?;

        tokio::spawn(async move {
            tracing::debug!("[STREAM] OpenAI streaming task started");
            let mut stream = response.bytes_stream();
            let mut sse = SseBuffer::new();
            let mut stop_reason = None;
            let mut saw_done = false;

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
                    if data == "[DONE]" {
                        tracing::debug!("[STREAM] Received [DONE]");
                        saw_done = true;
                        break 'read;
                    }

                    let Ok(stream_chunk) = serde_json::from_str::<OpenAIStreamChunk>(&data) else {
                        tracing::debug!("Skipping unparseable stream chunk");
                        continue;
                    };

                    if let Some(choice) = stream_chunk.choices.into_iter().next() {
                        if choice.finish_reason.is_some() {
                            stop_reason = choice.finish_reason;
                        }
                        if let Some(content) = choice.delta.content {
                            if tx.send(Ok(StreamChunk::TextDelta(content))).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }

            if !saw_done {
                let err = truncated_stream_error(&sse, "[DONE]");
                tracing::warn!("OpenAI stream truncated: {}", err);
                let _ = tx.send(Err(err.into())).await;
                return;
            }

            let _ = tx.send(Ok(StreamChunk::Done { stop_reason })).await;
            tracing::debug!("[STREAM] OpenAI streaming task finished");
        });

        Ok(rx)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
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
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    stream: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    id: String,
    model: String,
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Streaming types

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChunk {
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}
