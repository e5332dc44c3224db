// Critique and revision request templates
//
// Templates use `{name}` placeholders that are substituted verbatim. The
// defaults use the Human/Assistant framing and instruct the model to finish
// with one of the markers in `markers`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::principles::Principle;

pub const DEFAULT_CRITIQUE_TEMPLATE: &str = r#"
    Human: Hello Constitutional Principle Bot!

    Assistant: Below is a conversation between a human and an AI model.
    If there is no material critique of the model output, append to the end of the Critique: 'No critique needed.'
    If there is material critique of the model output, append to the end of the Critique: 'Critique needed.'

    Human: {input_prompt}

    Assistant: {output_from_model}

    Human: Critique Request: {critique_request}


"#;

pub const DEFAULT_REVISION_TEMPLATE: &str = r#"
    Human: {input_prompt}

    Assistant: {output_from_model}

    Human: Critique Request: {critique_request}

    Assistant: Critique: {critique}

    Human:
    If the critique does not identify anything worth changing, ignore the Revision Request and do not make any revisions. Instead, return "No revisions needed".
    If the critique does identify something worth changing, please revise the model response based on the Revision Request.

    Revision Request: {revision_request}

    Assistant: Revision:
"#;

const CRITIQUE_PLACEHOLDERS: &[&str] = &["input_prompt", "output_from_model", "critique_request"];

const REVISION_PLACEHOLDERS: &[&str] = &[
    "input_prompt",
    "output_from_model",
    "critique_request",
    "critique",
    "revision_request",
];

/// The pair of templates a run uses to build model requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    #[serde(default = "default_critique")]
    pub critique: String,
    #[serde(default = "default_revision")]
    pub revision: String,
}

fn default_critique() -> String {
    DEFAULT_CRITIQUE_TEMPLATE.to_string()
}

fn default_revision() -> String {
    DEFAULT_REVISION_TEMPLATE.to_string()
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            critique: default_critique(),
            revision: default_revision(),
        }
    }
}

impl PromptTemplates {
    /// Check that every placeholder the engine fills is present.
    pub fn validate(&self) -> Result<()> {
        check_placeholders("critique", &self.critique, CRITIQUE_PLACEHOLDERS)?;
        check_placeholders("revision", &self.revision, REVISION_PLACEHOLDERS)?;
        Ok(())
    }

    pub fn critique_request(&self, prompt: &str, answer: &str, principle: &Principle) -> String {
        render(
            &self.critique,
            &[
                ("input_prompt", prompt),
                ("output_from_model", answer),
                ("critique_request", principle.critique_question()),
            ],
        )
    }

    pub fn revision_request(
        &self,
        prompt: &str,
        answer: &str,
        principle: &Principle,
        critique: &str,
    ) -> String {
        render(
            &self.revision,
            &[
                ("input_prompt", prompt),
                ("output_from_model", answer),
                ("critique_request", principle.critique_question()),
                ("critique", critique),
                ("revision_request", principle.revision_instruction()),
            ],
        )
    }
}

fn check_placeholders(kind: &str, template: &str, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !template.contains(&format!("{{{}}}", name)))
        .collect();

    if !missing.is_empty() {
        bail!(
            "{} template is missing placeholder(s): {}",
            kind,
            missing
                .iter()
                .map(|m| format!("{{{}}}", m))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

/// Single pass over the template so values containing `{...}` are never
/// re-expanded.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let substituted = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match substituted {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
