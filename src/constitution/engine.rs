// Critique/revision engine
//
// Runs one prompt through the principle registry: initial completion, then
// for each principle a critique and, when the critique asks for it, a
// revision. Principles are evaluated strictly in order because each one sees
// the answer left by the previous one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::error::{RunError, RunResult};
use super::markers::{parse_critique, parse_revision, CritiqueVerdict, RevisionVerdict};
use super::prompts::PromptTemplates;
use super::trail::{CritiqueOutcome, RunEvent, RunTrail};
use super::ModelInvoker;
use crate::principles::{Principle, PrincipleRegistry};

/// Buffered events between a spawned run and its consumer.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Handle to a run executing on a background task.
pub struct RunHandle {
    /// One `Started`, one `Outcome` per principle reached, one `Finished`.
    /// Closed when the run ends, including when it fails.
    pub events: mpsc::Receiver<RunEvent>,
    pub task: JoinHandle<RunResult<RunTrail>>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// Ask the run to stop before its next model call.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to finish.
    pub async fn join(self) -> RunResult<RunTrail> {
        self.task
            .await
            .map_err(|e| RunError::TaskAborted(e.to_string()))?
    }
}

/// The critique/revision loop, parameterised by its request templates.
#[derive(Debug, Clone, Default)]
pub struct CritiqueEngine {
    templates: PromptTemplates,
}

impl CritiqueEngine {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Run to completion and return the trail.
    pub async fn run(
        &self,
        prompt: &str,
        registry: &PrincipleRegistry,
        invoker: &dyn ModelInvoker,
    ) -> RunResult<RunTrail> {
        self.execute(prompt, registry, invoker, &CancellationToken::new(), None)
            .await
    }

    /// Run with cooperative cancellation, sending progress events as they
    /// happen. A dropped receiver does not stop the run.
    pub async fn run_observed(
        &self,
        prompt: &str,
        registry: &PrincipleRegistry,
        invoker: &dyn ModelInvoker,
        cancel: &CancellationToken,
        events: &mpsc::Sender<RunEvent>,
    ) -> RunResult<RunTrail> {
        self.execute(prompt, registry, invoker, cancel, Some(events))
            .await
    }

    /// Start a run on a tokio task.
    pub fn spawn(
        &self,
        prompt: impl Into<String>,
        registry: Arc<PrincipleRegistry>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> RunHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let engine = self.clone();
        let prompt = prompt.into();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            engine
                .run_observed(&prompt, &registry, invoker.as_ref(), &task_cancel, &tx)
                .await
        });

        RunHandle {
            events: rx,
            task,
            cancel,
        }
    }

    async fn execute(
        &self,
        prompt: &str,
        registry: &PrincipleRegistry,
        invoker: &dyn ModelInvoker,
        cancel: &CancellationToken,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> RunResult<RunTrail> {
        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("constitutional_run", %run_id, principles = registry.len());

        async move {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }

            info!("Requesting initial completion");
            let initial_answer = invoker
                .complete(prompt)
                .await
                .map_err(RunError::InitialCompletion)?;

            emit(
                events,
                RunEvent::Started {
                    initial_answer: initial_answer.clone(),
                },
            )
            .await;

            let mut current_answer = initial_answer.clone();
            let mut outcomes = Vec::with_capacity(registry.len());
            let mut cancelled = false;

            for principle in registry.iter() {
                if cancel.is_cancelled() {
                    info!(principle = %principle.name(), "Run cancelled");
                    cancelled = true;
                    break;
                }

                let step = self
                    .evaluate(prompt, &current_answer, principle, invoker, cancel)
                    .await;
                cancelled = step.cancelled;
                current_answer = step.outcome.answer_after.clone();

                emit(events, RunEvent::Outcome(step.outcome.clone())).await;
                outcomes.push(step.outcome);

                if cancelled {
                    break;
                }
            }

            emit(
                events,
                RunEvent::Finished {
                    final_answer: current_answer.clone(),
                    cancelled,
                },
            )
            .await;

            let trail = RunTrail {
                prompt: prompt.to_string(),
                initial_answer,
                outcomes,
                final_answer: current_answer,
                cancelled,
            };

            info!(
                evaluated = trail.outcomes.len(),
                revisions = trail.revision_count(),
                cancelled,
                "Run finished"
            );

            Ok(trail)
        }
        .instrument(span)
        .await
    }

    /// Critique one principle and revise if warranted. Never fails: model
    /// errors are folded into the outcome.
    async fn evaluate(
        &self,
        prompt: &str,
        current_answer: &str,
        principle: &Principle,
        invoker: &dyn ModelInvoker,
        cancel: &CancellationToken,
    ) -> Step {
        let unchanged = |critique_text: String, verdict: CritiqueVerdict, error: Option<String>| {
            CritiqueOutcome {
                principle_name: principle.name().to_string(),
                critique_text,
                verdict,
                needs_revision: verdict.needs_revision(),
                revision_text: None,
                answer_after: current_answer.to_string(),
                error,
            }
        };

        let critique_request = self
            .templates
            .critique_request(prompt, current_answer, principle);

        let critique_text = match invoker.complete(&critique_request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(principle = %principle.name(), error = %e, "Critique failed, skipping principle");
                // Ambiguous never requests a revision.
                return Step::done(unchanged(
                    String::new(),
                    CritiqueVerdict::Ambiguous,
                    Some(format!("critique failed: {}", e)),
                ));
            }
        };

        let verdict = parse_critique(&critique_text);
        info!(principle = %principle.name(), ?verdict, "Critique classified");

        if !verdict.needs_revision() || !principle.can_revise() {
            return Step::done(unchanged(critique_text, verdict, None));
        }

        if cancel.is_cancelled() {
            info!(principle = %principle.name(), "Run cancelled before revision");
            let outcome = unchanged(
                critique_text,
                verdict,
                Some("cancelled before revision".to_string()),
            );
            return Step {
                outcome,
                cancelled: true,
            };
        }

        let revision_request = self.templates.revision_request(
            prompt,
            current_answer,
            principle,
            &critique_text,
        );

        match invoker.complete(&revision_request).await {
            Ok(text) => match parse_revision(&text) {
                RevisionVerdict::Revised(revised) => {
                    debug!(principle = %principle.name(), "Answer revised");
                    Step::done(CritiqueOutcome {
                        revision_text: Some(revised.clone()),
                        answer_after: revised,
                        ..unchanged(critique_text, verdict, None)
                    })
                }
                RevisionVerdict::Unchanged => {
                    debug!(principle = %principle.name(), "Model declined to revise");
                    Step::done(unchanged(critique_text, verdict, None))
                }
            },
            Err(e) => {
                warn!(principle = %principle.name(), error = %e, "Revision failed, keeping current answer");
                Step::done(unchanged(
                    critique_text,
                    verdict,
                    Some(format!("revision failed: {}", e)),
                ))
            }
        }
    }
}

struct Step {
    outcome: CritiqueOutcome,
    cancelled: bool,
}

impl Step {
    fn done(outcome: CritiqueOutcome) -> Self {
        Self {
            outcome,
            cancelled: false,
        }
    }
}

async fn emit(events: Option<&mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            debug!("Run event receiver dropped");
        }
    }
}
