// Run trail types
//
// A run produces one `CritiqueOutcome` per principle and is summarized by a
// `RunTrail`. Both serialize to JSON for transcripts and `--json` output.

use serde::{Deserialize, Serialize};

use super::markers::CritiqueVerdict;

/// Result of evaluating one principle against the running answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueOutcome {
    pub principle_name: String,

    /// Raw critique text from the model. Empty when the critique call failed.
    pub critique_text: String,

    /// How the critique text was classified.
    pub verdict: CritiqueVerdict,

    pub needs_revision: bool,

    /// Present only when the model actually rewrote the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_text: Option<String>,

    /// Answer carried forward to the next principle.
    pub answer_after: String,

    /// Recovered critique or revision failure for this principle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CritiqueOutcome {
    pub fn revised(&self) -> bool {
        self.revision_text.is_some()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// True when the critique carried neither marker.
    pub fn marker_ambiguous(&self) -> bool {
        self.verdict == CritiqueVerdict::Ambiguous && self.error.is_none()
    }
}

/// Complete record of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTrail {
    pub prompt: String,
    pub initial_answer: String,
    pub outcomes: Vec<CritiqueOutcome>,
    pub final_answer: String,

    /// The run stopped early; `outcomes` covers only the principles reached.
    #[serde(default)]
    pub cancelled: bool,
}

impl RunTrail {
    /// Number of principles whose revision replaced the answer.
    pub fn revision_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.revised()).count()
    }

    /// Outcomes that recorded a recovered model failure.
    pub fn failures(&self) -> impl Iterator<Item = &CritiqueOutcome> {
        self.outcomes.iter().filter(|o| o.failed())
    }

    pub fn changed(&self) -> bool {
        self.final_answer != self.initial_answer
    }
}

/// Progress notification emitted while a run executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started { initial_answer: String },
    Outcome(CritiqueOutcome),
    Finished { final_answer: String, cancelled: bool },
}
