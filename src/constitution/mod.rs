// Constitutional critique/revision loop
//
// The engine only talks to the model through `ModelInvoker`: request text in,
// complete response text out. Provider wiring, streaming reassembly and output
// cleanup live behind that trait (see `crate::invoker`).

use async_trait::async_trait;

pub mod engine;
pub mod error;
pub mod markers;
pub mod prompts;
pub mod recorder;
pub mod trail;

pub use engine::{CritiqueEngine, RunHandle};
pub use error::{ModelInvocationError, RunError, RunResult};
pub use markers::{
    parse_critique, parse_revision, CritiqueVerdict, RevisionVerdict, CRITIQUE_NEEDED,
    NO_CRITIQUE_NEEDED, NO_REVISIONS_NEEDED,
};
pub use prompts::PromptTemplates;
pub use recorder::TrailRecorder;
pub use trail::{CritiqueOutcome, RunEvent, RunTrail};

/// Text-in, text-out access to a model.
///
/// Implementations own transport, retries, timeouts and chunk reassembly; the
/// engine sees only the complete response or a failure.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String, ModelInvocationError>;
}
