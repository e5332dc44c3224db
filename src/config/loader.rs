// Configuration loader
// Loads settings from ~/.covenant/config.toml (or an explicit path), falling
// back to API keys in the environment

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::provider::ProviderEntry;
use super::settings::{CleanupConfig, Config, InferenceConfig, LoggingConfig};
use crate::constitution::PromptTemplates;
use crate::principles::Principle;

/// On-disk layout. Every section is optional.
#[derive(Deserialize)]
struct TomlConfig {
    #[serde(default)]
    providers: Vec<ProviderEntry>,
    #[serde(default = "default_streaming")]
    streaming_enabled: bool,
    #[serde(default)]
    inference: InferenceConfig,
    #[serde(default)]
    cleanup: CleanupConfig,
    #[serde(default)]
    prompts: PromptTemplates,
    #[serde(default)]
    principles: Vec<Principle>,
    #[serde(default)]
    logging: LoggingConfig,
}

fn default_streaming() -> bool {
    true
}

/// Default config file location
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, `~/.covenant/config.toml` is
/// used when present, otherwise providers come from `ANTHROPIC_API_KEY` or
/// `OPENAI_API_KEY`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_from_file(path)?,
        None => {
            let default_path = default_config_path()?;
            if default_path.exists() {
                load_from_file(&default_path)?
            } else {
                tracing::debug!(
                    "No config file at {}, using environment",
                    default_path.display()
                );
                Config::with_providers(env_providers())
            }
        }
    };

    if config.providers.is_empty() {
        bail!(
            "No model provider configured.\n\n\
             Add a provider to ~/.covenant/config.toml:\n\n  \
             [[providers]]\n  \
             type = \"claude\"\n  \
             api_key = \"sk-ant-...\"\n\n\
             Or set an environment variable:\n  \
             export {}=\"sk-ant-...\"",
            ANTHROPIC_API_KEY_ENV
        );
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    tracing::debug!(
        "Loaded config from {} ({} provider(s), {} principle(s))",
        path.display(),
        config.providers.len(),
        config.principles.len()
    );

    Ok(config)
}

/// Parse TOML contents. A file without `[[providers]]` picks up providers
/// from the environment. Does not validate.
pub fn parse_config(contents: &str) -> Result<Config> {
    let toml_config: TomlConfig = toml::from_str(contents)?;

    let providers = if toml_config.providers.is_empty() {
        env_providers()
    } else {
        toml_config.providers
    };

    Ok(Config {
        providers,
        streaming_enabled: toml_config.streaming_enabled,
        inference: toml_config.inference,
        cleanup: toml_config.cleanup,
        prompts: toml_config.prompts,
        principles: toml_config.principles,
        logging: toml_config.logging,
    })
}

/// Providers derived from API key environment variables
fn env_providers() -> Vec<ProviderEntry> {
    let from_env = |var: &str| std::env::var(var).ok().filter(|key| !key.trim().is_empty());

    let mut providers = Vec::new();
    if let Some(api_key) = from_env(ANTHROPIC_API_KEY_ENV) {
        providers.push(ProviderEntry::Claude {
            api_key,
            model: None,
            base_url: None,
            name: Some("Claude (Environment)".to_string()),
        });
    }
    if let Some(api_key) = from_env(OPENAI_API_KEY_ENV) {
        providers.push(ProviderEntry::Openai {
            api_key,
            model: None,
            base_url: None,
            name: Some("OpenAI (Environment)".to_string()),
        });
    }
    providers
}
