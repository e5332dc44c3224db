// Session trail recorder
//
// Run-scoped, append-only log of outcomes as they arrive from the engine. The
// presentation layer reads snapshots while the run is still producing.

use tracing::debug;

use super::trail::{CritiqueOutcome, RunEvent};

/// Append-only outcome log for a single run.
#[derive(Debug, Default)]
pub struct TrailRecorder {
    outcomes: Vec<CritiqueOutcome>,
    initial_answer: Option<String>,
    final_answer: Option<String>,
    cancelled: bool,
}

impl TrailRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outcome.
    pub fn record(&mut self, outcome: CritiqueOutcome) {
        debug!(
            principle = %outcome.principle_name,
            position = self.outcomes.len(),
            "Recording outcome"
        );
        self.outcomes.push(outcome);
    }

    /// Feed an engine event. Outcomes are recorded; start and finish events
    /// capture the initial and final answers.
    pub fn observe(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { initial_answer } => {
                self.initial_answer = Some(initial_answer.clone());
            }
            RunEvent::Outcome(outcome) => self.record(outcome.clone()),
            RunEvent::Finished {
                final_answer,
                cancelled,
            } => {
                self.final_answer = Some(final_answer.clone());
                self.cancelled = *cancelled;
            }
        }
    }

    /// Copy of the outcomes recorded so far.
    pub fn snapshot(&self) -> Vec<CritiqueOutcome> {
        self.outcomes.clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn initial_answer(&self) -> Option<&str> {
        self.initial_answer.as_deref()
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.final_answer.is_some()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Flat diagnostic rendering: `START` followed by one
    /// ` CHUNK <json> ### ` segment per recorded outcome.
    pub fn diagnostic_log(&self) -> String {
        let mut log = String::from("START ");
        for outcome in &self.outcomes {
            let json = serde_json::to_string(outcome).unwrap_or_else(|e| {
                format!("{{\"serialization_error\":{:?}}}", e.to_string())
            });
            log.push_str(" CHUNK ");
            log.push_str(&json);
            log.push_str(" ### ");
        }
        log
    }
}
