// Error types for the critique/revision loop

use std::time::Duration;
use thiserror::Error;

/// Failure of a single call to the model.
///
/// Returned by every [`ModelInvoker`](super::ModelInvoker). When it happens on
/// the initial completion it aborts the run; during a critique or revision it
/// is recorded on the outcome and the run continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelInvocationError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model response could not be parsed: {0}")]
    Malformed(String),
}

impl ModelInvocationError {
    /// Build a `Request` error from any displayable error, keeping its cause chain.
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(format!("{:#}", err))
    }
}

/// Fatal errors from [`CritiqueEngine::run`](super::CritiqueEngine::run).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("initial completion failed: {0}")]
    InitialCompletion(#[source] ModelInvocationError),

    /// Cancelled before the initial completion, so there is no answer to
    /// build a trail around. Cancellation after that point is not an error:
    /// the run returns its partial trail with `cancelled` set.
    #[error("run cancelled before the initial completion")]
    Cancelled,

    #[error("run task aborted: {0}")]
    TaskAborted(String),
}

pub type RunResult<T> = std::result::Result<T, RunError>;
