// Provider factory
//
// Creates LLM providers from `[[providers]]` config entries

use anyhow::{Context, Result};

use super::claude::ClaudeProvider;
use super::openai::OpenAIProvider;
use super::LlmProvider;
use crate::config::ProviderEntry;

/// Create an `LlmProvider` from a config entry.
pub fn create_provider_from_entry(entry: &ProviderEntry) -> Result<Box<dyn LlmProvider>> {
    match entry {
        ProviderEntry::Claude {
            api_key,
            model,
            base_url,
            ..
        } => {
            let mut provider = ClaudeProvider::new(api_key.clone())?;
            if let Some(m) = model {
                provider = provider.with_model(m.clone());
            }
            if let Some(url) = base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(Box::new(provider))
        }

        ProviderEntry::Openai {
            api_key,
            model,
            base_url,
            ..
        } => {
            let mut provider = OpenAIProvider::new_openai(api_key.clone())?;
            if let Some(m) = model {
                provider = provider.with_model(m.clone());
            }
            if let Some(url) = base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(Box::new(provider))
        }
    }
}

/// Create the provider for the first configured entry.
pub fn create_primary_provider(entries: &[ProviderEntry]) -> Result<Box<dyn LlmProvider>> {
    let entry = entries
        .first()
        .context("No providers configured - need at least one [[providers]] entry")?;

    create_provider_from_entry(entry)
        .with_context(|| format!("Failed to create provider '{}'", entry.display_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_claude_provider() {
        let entry = ProviderEntry::Claude {
            api_key: "test-key".to_string(),
            model: Some("claude-3-5-sonnet-latest".to_string()),
            base_url: None,
            name: None,
        };
        let provider = create_provider_from_entry(&entry).unwrap();
        assert_eq!(provider.name(), "claude");
        assert_eq!(provider.default_model(), "claude-3-5-sonnet-latest");
    }

    #[test]
    fn test_create_openai_provider() {
        let entry = ProviderEntry::Openai {
            api_key: "test-key".to_string(),
            model: None,
            base_url: Some("http://localhost:8080/".to_string()),
            name: Some("Local gateway".to_string()),
        };
        let provider = create_provider_from_entry(&entry).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_no_entries_is_error() {
        let result = create_primary_provider(&[]);
        assert!(result.is_err());
    }
}
