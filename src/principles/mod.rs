// Principle registry
//
// An ordered set of named principles. Each principle poses a critique question
// to the model and, optionally, a revision instruction to apply when the
// critique finds a problem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod defaults;

pub use defaults::{
    clinical_hippocratic_principle, default_registry, honesty_principle, verified_source_principle,
};

/// A principle with this name is already registered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate principle name: {name:?}")]
pub struct DuplicateNameError {
    pub name: String,
}

/// A named rule the model's answer is critiqued against.
///
/// Deserializes from the `[[principles]]` tables of the config file, which use
/// the `critique_request` / `revision_request` key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principle {
    name: String,
    #[serde(rename = "critique_request")]
    critique_question: String,
    /// Empty means observational only: critiqued, never revised.
    #[serde(rename = "revision_request", default)]
    revision_instruction: String,
}

impl Principle {
    pub fn new(
        name: impl Into<String>,
        critique_question: impl Into<String>,
        revision_instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            critique_question: critique_question.into(),
            revision_instruction: revision_instruction.into(),
        }
    }

    /// A principle that is critiqued but never triggers a rewrite.
    pub fn observational(name: impl Into<String>, critique_question: impl Into<String>) -> Self {
        Self::new(name, critique_question, "")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn critique_question(&self) -> &str {
        &self.critique_question
    }

    pub fn revision_instruction(&self) -> &str {
        &self.revision_instruction
    }

    /// Whether a material critique may lead to a revision request. A blank
    /// instruction makes the principle critique-only; config validation
    /// rejects the whitespace-only spelling of that.
    pub fn can_revise(&self) -> bool {
        !self.revision_instruction.trim().is_empty()
    }
}

/// Ordered, name-unique collection of principles.
///
/// Read-only once built; share it across concurrent runs behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipleRegistry {
    principles: Vec<Principle>,
}

impl PrincipleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a principle, rejecting a name that is already present.
    pub fn add(&mut self, principle: Principle) -> Result<(), DuplicateNameError> {
        if self.contains(principle.name()) {
            return Err(DuplicateNameError {
                name: principle.name.clone(),
            });
        }
        self.principles.push(principle);
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, principle: Principle) -> Result<Self, DuplicateNameError> {
        self.add(principle)?;
        Ok(self)
    }

    /// Build a registry from an ordered list, failing on the first duplicate.
    pub fn from_principles(
        principles: impl IntoIterator<Item = Principle>,
    ) -> Result<Self, DuplicateNameError> {
        let mut registry = Self::new();
        for principle in principles {
            registry.add(principle)?;
        }
        Ok(registry)
    }

    /// Principles in insertion order. Each call starts from the beginning.
    pub fn iter(&self) -> std::slice::Iter<'_, Principle> {
        self.principles.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Principle> {
        self.principles.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.principles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principles.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.principles.iter().map(|p| p.name()).collect()
    }
}

impl<'a> IntoIterator for &'a PrincipleRegistry {
    type Item = &'a Principle;
    type IntoIter = std::slice::Iter<'a, Principle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
