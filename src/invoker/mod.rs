// Provider-backed model invoker
//
// Adapts an `LlmProvider` to the engine's `ModelInvoker`: applies inference
// settings, reassembles streamed chunks into one response, enforces the
// per-call timeout and cleans up the text.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, trace};

use crate::config::{Config, InferenceConfig};
use crate::constitution::{ModelInvocationError, ModelInvoker};
use crate::providers::{create_primary_provider, LlmProvider, ProviderRequest, StreamChunk};

pub mod cleanup;

pub use cleanup::OutputCleaner;

pub struct ProviderInvoker {
    provider: Arc<dyn LlmProvider>,
    inference: InferenceConfig,
    streaming: bool,
    cleaner: OutputCleaner,
}

impl ProviderInvoker {
    /// Non-streaming invoker with no output cleanup.
    pub fn new(provider: Arc<dyn LlmProvider>, inference: InferenceConfig) -> Self {
        Self {
            provider,
            inference,
            streaming: false,
            cleaner: OutputCleaner::passthrough(),
        }
    }

    /// Build the invoker for the first configured provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_primary_provider(&config.providers)?);
        let cleaner = OutputCleaner::new(&config.cleanup)?;

        Ok(Self::new(provider, config.inference.clone())
            .with_streaming(config.streaming_enabled)
            .with_cleaner(cleaner))
    }

    /// Streaming is only used when the provider supports it.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_cleaner(mut self, cleaner: OutputCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// e.g. "claude (claude-3-5-haiku-latest)"
    pub fn model_label(&self) -> String {
        format!("{} ({})", self.provider.name(), self.provider.default_model())
    }

    fn build_request(&self, text: &str) -> ProviderRequest {
        ProviderRequest::from_prompt(text).with_inference(&self.inference)
    }

    async fn request_text(&self, text: &str) -> Result<String> {
        let request = self.build_request(text);

        if self.streaming && self.provider.supports_streaming() {
            let rx = self
                .provider
                .send_message_stream(&request.with_stream(true))
                .await?;
            collect_stream(rx).await
        } else {
            let response = self.provider.send_message(&request).await?;
            debug!(
                provider = %response.provider,
                stop_reason = ?response.stop_reason,
                "Completion received"
            );
            Ok(response.text)
        }
    }
}

#[async_trait]
impl ModelInvoker for ProviderInvoker {
    async fn complete(&self, text: &str) -> Result<String, ModelInvocationError> {
        let timeout = self.inference.timeout();

        let raw = match tokio::time::timeout(timeout, self.request_text(text)).await {
            Err(_) => return Err(ModelInvocationError::Timeout(timeout)),
            Ok(result) => result.map_err(into_invocation_error)?,
        };

        let cleaned = self.cleaner.clean(&raw);
        if cleaned.is_empty() {
            return Err(ModelInvocationError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

/// Concatenate text deltas until `Done`. A channel that closes first means
/// the response was cut short and yields `Malformed`.
pub async fn collect_stream(mut rx: Receiver<Result<StreamChunk>>) -> Result<String> {
    let mut text = String::new();

    while let Some(chunk) = rx.recv().await {
        match chunk? {
            StreamChunk::TextDelta(delta) => {
                trace!(len = delta.len(), "Stream delta");
                text.push_str(&delta);
            }
            StreamChunk::Done { stop_reason } => {
                debug!(?stop_reason, "Stream complete");
                return Ok(text);
            }
        }
    }

    Err(ModelInvocationError::Malformed(format!(
        "stream closed after {} bytes without completing",
        text.len()
    ))
    .into())
}

/// Keep typed failures from the provider; anything else is a transport error.
fn into_invocation_error(err: anyhow::Error) -> ModelInvocationError {
    match err.downcast_ref::<ModelInvocationError>() {
        Some(typed) => typed.clone(),
        None => ModelInvocationError::request(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderResponse;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Replays canned text, either whole or as one delta per word.
    struct FakeProvider {
        reply: String,
        delay: Duration,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl FakeProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
            self.seen.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            Ok(ProviderResponse {
                id: "1".to_string(),
                model: "fake".to_string(),
                text: self.reply.clone(),
                stop_reason: None,
                provider: "fake".to_string(),
            })
        }

        async fn send_message_stream(
            &self,
            request: &ProviderRequest,
        ) -> Result<Receiver<Result<StreamChunk>>> {
            self.seen.lock().unwrap().push(request.clone());
            let (tx, rx) = mpsc::channel(16);
            let words: Vec<String> = self
                .reply
                .split_inclusive(' ')
                .map(str::to_string)
                .collect();
            tokio::spawn(async move {
                for word in words {
                    let _ = tx.send(Ok(StreamChunk::TextDelta(word))).await;
                }
                let _ = tx.send(Ok(StreamChunk::Done { stop_reason: None })).await;
            });
            Ok(rx)
        }

        fn name(&self) -> &str {
            "fake"
        }

        fn default_model(&self) -> &str {
            "fake-1"
        }
    }

    #[tokio::test]
    async fn test_streaming_reassembles_chunks() {
        let provider = Arc::new(FakeProvider::new("The answer is four. No critique needed."));
        let invoker =
            ProviderInvoker::new(provider.clone(), InferenceConfig::default()).with_streaming(true);

        let text = invoker.complete("2+2?").await.unwrap();
        assert_eq!(text, "The answer is four. No critique needed.");

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].stream);
        assert_eq!(seen[0].max_tokens, InferenceConfig::default().max_tokens);
    }

    #[tokio::test]
    async fn test_cleanup_applied() {
        let provider = Arc::new(FakeProvider::new("<summary>Stable.</summary>"));
        let invoker = ProviderInvoker::new(provider, InferenceConfig::default())
            .with_cleaner(OutputCleaner::new(&Default::default()).unwrap());

        assert_eq!(invoker.complete("x").await.unwrap(), "Stable.");
    }

    #[tokio::test]
    async fn test_blank_response_is_error() {
        let provider = Arc::new(FakeProvider::new("  \n"));
        let invoker = ProviderInvoker::new(provider, InferenceConfig::default());

        assert_eq!(
            invoker.complete("x").await,
            Err(ModelInvocationError::EmptyResponse)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut provider = FakeProvider::new("late");
        provider.delay = Duration::from_secs(10);
        let inference = InferenceConfig {
            timeout_secs: 1,
            ..InferenceConfig::default()
        };
        let invoker = ProviderInvoker::new(Arc::new(provider), inference);

        assert_eq!(
            invoker.complete("x").await,
            Err(ModelInvocationError::Timeout(Duration::from_secs(1)))
        );
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(StreamChunk::TextDelta("partial".to_string())))
            .await
            .unwrap();
        tx.send(Err(anyhow::anyhow!("connection reset"))).await.unwrap();
        drop(tx);

        assert!(collect_stream(rx).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_closed_without_done_is_malformed() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(StreamChunk::TextDelta("Take 500mg every".to_string())))
            .await
            .unwrap();
        drop(tx);

        let err = collect_stream(rx).await.unwrap_err();
        assert!(matches!(
            into_invocation_error(err),
            ModelInvocationError::Malformed(_)
        ));
    }

    #[test]
    fn test_typed_errors_preserved() {
        let err: anyhow::Error = ModelInvocationError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        let err = err.context("while calling provider");

        assert!(matches!(
            into_invocation_error(err),
            ModelInvocationError::Status { status: 500, .. }
        ));
        assert!(matches!(
            into_invocation_error(anyhow::anyhow!("dns failure")),
            ModelInvocationError::Request(_)
        ));
    }
}
