// Cosmetic cleanup of model output
//
// Removes wrapper tags the prompt asked the model to emit and normalizes turn
// prefixes. Never touches the verdict markers.

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::CleanupConfig;

#[derive(Debug, Clone, Default)]
pub struct OutputCleaner {
    tag_pattern: Option<Regex>,
    rewrite_model_prefix: bool,
}

impl OutputCleaner {
    pub fn new(config: &CleanupConfig) -> Result<Self> {
        let tags: Vec<String> = config
            .strip_tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        let tag_pattern = if tags.is_empty() {
            None
        } else {
            let pattern = format!(r"</?(?:{})>", tags.join("|"));
            Some(Regex::new(&pattern).context("Failed to build tag cleanup pattern")?)
        };

        Ok(Self {
            tag_pattern,
            rewrite_model_prefix: config.rewrite_model_prefix,
        })
    }

    /// Leaves text untouched
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = match &self.tag_pattern {
            Some(re) => re.replace_all(text, "").into_owned(),
            None => text.to_string(),
        };

        if self.rewrite_model_prefix {
            cleaned = cleaned.replace("Model:", "Assistant:");
        }

        cleaned.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_summary_tags() {
        let cleaner = OutputCleaner::new(&CleanupConfig::default()).unwrap();
        assert_eq!(
            cleaner.clean("\n<summary>Patient is stable.</summary>\n"),
            "Patient is stable."
        );
    }

    #[test]
    fn test_rewrites_model_prefix() {
        let cleaner = OutputCleaner::new(&CleanupConfig::default()).unwrap();
        assert_eq!(cleaner.clean("Model: hello"), "Assistant: hello");
    }

    #[test]
    fn test_markers_survive_cleanup() {
        let cleaner = OutputCleaner::new(&CleanupConfig::default()).unwrap();
        let cleaned = cleaner.clean("<summary>Fine.</summary> No critique needed.");
        assert_eq!(cleaned, "Fine. No critique needed.");
    }

    #[test]
    fn test_tag_names_are_escaped() {
        let config = CleanupConfig {
            strip_tags: vec!["a.b".to_string()],
            rewrite_model_prefix: false,
        };
        let cleaner = OutputCleaner::new(&config).unwrap();
        assert_eq!(cleaner.clean("<a.b>x</a.b> <axb>"), "x <axb>");
    }

    #[test]
    fn test_passthrough_only_trims() {
        let cleaner = OutputCleaner::passthrough();
        assert_eq!(cleaner.clean(" <summary>Model: x</summary> "), "<summary>Model: x</summary>");
    }
}
