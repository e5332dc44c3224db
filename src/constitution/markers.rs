// Marker parsing
//
// The model signals its verdict with fixed literals at the end of a critique
// ("Critique needed." / "No critique needed.") and with "No revisions needed"
// in place of a rewrite. These functions classify free text into closed sets
// of outcomes so the engine never matches on strings itself.

use serde::{Deserialize, Serialize};

/// Appended by the model when the critique found a material problem.
pub const CRITIQUE_NEEDED: &str = "Critique needed.";

/// Appended by the model when there is nothing material to critique.
pub const NO_CRITIQUE_NEEDED: &str = "No critique needed.";

/// Returned by the model instead of a rewrite when nothing should change.
pub const NO_REVISIONS_NEEDED: &str = "No revisions needed";

/// Classification of a critique response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueVerdict {
    /// "Critique needed." present (wins over the negative marker).
    Needed,
    /// Only "No critique needed." present.
    NotNeeded,
    /// Neither marker present. Treated as no revision.
    Ambiguous,
}

impl CritiqueVerdict {
    /// Only an explicit positive marker requests a revision.
    pub fn needs_revision(self) -> bool {
        matches!(self, CritiqueVerdict::Needed)
    }
}

/// Classify a critique response.
///
/// Matching is case-sensitive: "No critique needed." does not contain
/// "Critique needed." (lowercase `c`), so the two markers never alias.
pub fn parse_critique(text: &str) -> CritiqueVerdict {
    if text.contains(CRITIQUE_NEEDED) {
        CritiqueVerdict::Needed
    } else if text.contains(NO_CRITIQUE_NEEDED) {
        CritiqueVerdict::NotNeeded
    } else {
        CritiqueVerdict::Ambiguous
    }
}

/// Classification of a revision response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionVerdict {
    /// The model declined to revise, or returned nothing usable.
    Unchanged,
    /// Rewritten answer, trimmed.
    Revised(String),
}

/// Classify a revision response.
///
/// The sentinel is never returned as revised text. A blank response is also
/// treated as unchanged so the running answer is never replaced by nothing.
pub fn parse_revision(text: &str) -> RevisionVerdict {
    if text.contains(NO_REVISIONS_NEEDED) {
        return RevisionVerdict::Unchanged;
    }

    let revised = text.trim();
    if revised.is_empty() {
        RevisionVerdict::Unchanged
    } else {
        RevisionVerdict::Revised(revised.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critique_needed() {
        let text = "The answer recommends an unsafe dose. Critique needed.";
        assert_eq!(parse_critique(text), CritiqueVerdict::Needed);
        assert!(parse_critique(text).needs_revision());
    }

    #[test]
    fn test_no_critique_needed() {
        let text = "The answer is accurate and cautious. No critique needed.";
        assert_eq!(parse_critique(text), CritiqueVerdict::NotNeeded);
        assert!(!parse_critique(text).needs_revision());
    }

    #[test]
    fn test_neither_marker_is_ambiguous() {
        let text = "The answer is mostly fine but could cite sources.";
        assert_eq!(parse_critique(text), CritiqueVerdict::Ambiguous);
        assert!(!parse_critique(text).needs_revision());
        assert_eq!(parse_critique(""), CritiqueVerdict::Ambiguous);
    }

    #[test]
    fn test_both_markers_favor_revision() {
        let text = "No critique needed. On reflection, the dosage is wrong. Critique needed.";
        assert_eq!(parse_critique(text), CritiqueVerdict::Needed);

        // Order in the text does not matter
        let text = "Critique needed. No critique needed.";
        assert_eq!(parse_critique(text), CritiqueVerdict::Needed);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(parse_critique("critique needed."), CritiqueVerdict::Ambiguous);
        assert_eq!(parse_critique("NO CRITIQUE NEEDED."), CritiqueVerdict::Ambiguous);
    }

    #[test]
    fn test_revision_sentinel_is_unchanged() {
        assert_eq!(parse_revision("No revisions needed"), RevisionVerdict::Unchanged);
        assert_eq!(
            parse_revision(" No revisions needed.\n"),
            RevisionVerdict::Unchanged
        );
    }

    #[test]
    fn test_revision_text_is_trimmed() {
        assert_eq!(
            parse_revision("\n  Revised: take fluids and rest.  \n"),
            RevisionVerdict::Revised("Revised: take fluids and rest.".to_string())
        );
    }

    #[test]
    fn test_blank_revision_is_unchanged() {
        assert_eq!(parse_revision("   \n"), RevisionVerdict::Unchanged);
    }
}
