// Configuration structs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::constants::*;
use super::provider::ProviderEntry;
use crate::constitution::PromptTemplates;
use crate::principles::{default_registry, DuplicateNameError, Principle, PrincipleRegistry};

fn default_true() -> bool {
    true
}

/// Sampling and transport parameters passed to every model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: Some(DEFAULT_TOP_P),
            top_k: Some(DEFAULT_TOP_K),
            max_tokens: DEFAULT_MAX_TOKENS,
            stop_sequences: vec![DEFAULT_STOP_SEQUENCE.to_string()],
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cosmetic cleanup applied to every model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Wrapper tags to remove, e.g. `summary` strips `<summary>` and `</summary>`
    pub strip_tags: Vec<String>,

    /// Rewrite `Model:` turn prefixes to `Assistant:`
    pub rewrite_model_prefix: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            strip_tags: vec!["summary".to_string()],
            rewrite_model_prefix: true,
        }
    }
}

/// Transcript persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub transcripts_enabled: bool,

    /// Defaults to `~/.covenant/transcripts.jsonl`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            transcripts_enabled: true,
            transcript_path: None,
        }
    }
}

impl LoggingConfig {
    /// Configured path (a leading `~/` expands to the home directory), or
    /// the default under the home directory.
    pub fn resolved_transcript_path(&self) -> Result<PathBuf> {
        match &self.transcript_path {
            Some(path) => match path.strip_prefix("~") {
                Ok(rest) => Ok(home_dir()?.join(rest)),
                Err(_) => Ok(path.clone()),
            },
            None => Ok(home_dir()?.join(CONFIG_DIR_NAME).join(TRANSCRIPT_FILE_NAME)),
        }
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Hosted model APIs in priority order; the first is used
    pub providers: Vec<ProviderEntry>,

    /// Stream responses from the provider and reassemble them
    pub streaming_enabled: bool,

    pub inference: InferenceConfig,

    pub cleanup: CleanupConfig,

    pub prompts: PromptTemplates,

    /// Custom principles; empty means the built-in set
    pub principles: Vec<Principle>,

    pub logging: LoggingConfig,
}

impl Config {
    pub fn with_providers(providers: Vec<ProviderEntry>) -> Self {
        Self {
            providers,
            streaming_enabled: true,
            inference: InferenceConfig::default(),
            cleanup: CleanupConfig::default(),
            prompts: PromptTemplates::default(),
            principles: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }

    /// The registry a run evaluates: custom principles in file order, or the
    /// built-in set when none are configured.
    pub fn registry(&self) -> Result<PrincipleRegistry, DuplicateNameError> {
        if self.principles.is_empty() {
            Ok(default_registry())
        } else {
            PrincipleRegistry::from_principles(self.principles.iter().cloned())
        }
    }

    pub fn primary_provider(&self) -> Option<&ProviderEntry> {
        self.providers.first()
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            bail!("No providers configured. Add a [[providers]] entry to the config file.");
        }

        for (idx, provider) in self.providers.iter().enumerate() {
            if provider.api_key().trim().is_empty() {
                bail!(
                    "API key for provider #{} ({}) is empty",
                    idx + 1,
                    provider.display_name()
                );
            }
        }

        let inference = &self.inference;
        if let Some(t) = inference.temperature {
            if !(0.0..=1.0).contains(&t) {
                bail!("temperature ({}) must be between 0.0 and 1.0", t);
            }
        }
        if let Some(p) = inference.top_p {
            if !(0.0..=1.0).contains(&p) {
                bail!("top_p ({}) must be between 0.0 and 1.0", p);
            }
        }
        if inference.max_tokens == 0 {
            bail!("max_tokens must be greater than 0");
        }
        if inference.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        self.prompts
            .validate()
            .context("Invalid prompt template")?;

        for principle in &self.principles {
            if principle.critique_question().trim().is_empty() {
                bail!("Principle '{}' has an empty critique_request", principle.name());
            }
            let instruction = principle.revision_instruction();
            if !instruction.is_empty() && instruction.trim().is_empty() {
                bail!(
                    "Principle '{}' has a whitespace-only revision_request; \
                     leave it out for a critique-only principle",
                    principle.name()
                );
            }
        }
        self.registry()
            .context("Invalid [[principles]] configuration")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claude() -> ProviderEntry {
        ProviderEntry::Claude {
            api_key: "sk-ant-test".to_string(),
            model: None,
            base_url: None,
            name: None,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = Config::with_providers(vec![claude()]);
        assert!(config.validate().is_ok());
        assert_eq!(config.registry().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_providers_rejected() {
        let config = Config::with_providers(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = Config::with_providers(vec![ProviderEntry::Openai {
            api_key: "  ".to_string(),
            model: None,
            base_url: None,
            name: None,
        }]);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("API key"));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = Config::with_providers(vec![claude()]);
        config.inference.temperature = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_principles_rejected() {
        let mut config = Config::with_providers(vec![claude()]);
        config.principles = vec![
            Principle::observational("same", "q1"),
            Principle::observational("same", "q2"),
        ];

        let err = config.validate().unwrap_err();
        let dup = err
            .downcast_ref::<DuplicateNameError>()
            .expect("duplicate name error in chain");
        assert_eq!(dup.name, "same");
    }

    #[test]
    fn test_whitespace_revision_request_rejected() {
        let mut config = Config::with_providers(vec![claude()]);
        config.principles = vec![Principle::new("blank", "q", "  \n")];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("whitespace-only revision_request"));

        config.principles = vec![Principle::observational("blank", "q")];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_principles_replace_defaults() {
        let mut config = Config::with_providers(vec![claude()]);
        config.principles = vec![Principle::observational("only", "q")];
        assert_eq!(config.registry().unwrap().names(), vec!["only"]);
    }

    #[test]
    fn test_transcript_path_override() {
        let logging = LoggingConfig {
            transcripts_enabled: true,
            transcript_path: Some(PathBuf::from("/tmp/t.jsonl")),
        };
        assert_eq!(
            logging.resolved_transcript_path().unwrap(),
            PathBuf::from("/tmp/t.jsonl")
        );
    }

    #[test]
    fn test_transcript_path_tilde_expands() {
        let logging = LoggingConfig {
            transcripts_enabled: true,
            transcript_path: Some(PathBuf::from("~/logs/t.jsonl")),
        };
        let resolved = logging.resolved_transcript_path().unwrap();
        assert!(!resolved.starts_with("~"));
        assert!(resolved.ends_with("logs/t.jsonl"));
    }
}
