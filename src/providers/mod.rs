// Hosted model providers
//
// An abstraction layer over LLM APIs (Claude, OpenAI-compatible) so the rest
// of the crate sends requests and reads responses through one interface.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

pub mod claude;
pub mod factory;
pub mod openai;
pub mod retry;
mod sse;
pub mod types;

pub use claude::ClaudeProvider;
pub use factory::{create_primary_provider, create_provider_from_entry};
pub use openai::OpenAIProvider;
pub use retry::{with_retry, RetryPolicy};
pub use types::{Message, ProviderRequest, ProviderResponse, StreamChunk};

/// Trait for LLM providers
///
/// All providers implement this trait, providing a unified interface for
/// sending messages and streaming responses.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a message and wait for the complete response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Send a message and stream the response
    ///
    /// The channel yields text deltas followed by one `StreamChunk::Done`, and
    /// is closed when the stream ends.
    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<Receiver<Result<StreamChunk>>>;

    /// Provider name (e.g., "claude", "openai")
    fn name(&self) -> &str;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;

    fn supports_streaming(&self) -> bool {
        true
    }
}
