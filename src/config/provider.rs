// Provider entry: one hosted model API the app can talk to

use serde::{Deserialize, Serialize};

/// A single provider entry.
///
/// Serializes with a `type` tag, e.g.:
/// ```toml
/// [[providers]]
/// type = "claude"
/// api_key = "sk-ant-..."
/// model = "claude-3-5-haiku-latest"
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderEntry {
    Claude {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Openai {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ProviderEntry {
    /// Human-readable name for display and transcripts.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Claude { name, .. } => name.as_deref().unwrap_or("Claude"),
            Self::Openai { name, .. } => name.as_deref().unwrap_or("OpenAI"),
        }
    }

    /// Short type tag, matching the `type` key in TOML.
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Claude { .. } => "claude",
            Self::Openai { .. } => "openai",
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Self::Claude { api_key, .. } | Self::Openai { api_key, .. } => api_key,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Claude { model, .. } | Self::Openai { model, .. } => model.as_deref(),
        }
    }
}

// Keys never appear in logs or debug output.
impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("type", &self.provider_type())
            .field("name", &self.display_name())
            .field("model", &self.model())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_entries() {
        #[derive(Deserialize)]
        struct Doc {
            providers: Vec<ProviderEntry>,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[providers]]
            type = "claude"
            api_key = "sk-ant-test"

            [[providers]]
            type = "openai"
            api_key = "sk-test"
            model = "gpt-4o"
            name = "GPT"
            "#,
        )
        .unwrap();

        assert_eq!(doc.providers[0].provider_type(), "claude");
        assert_eq!(doc.providers[0].display_name(), "Claude");
        assert_eq!(doc.providers[1].display_name(), "GPT");
        assert_eq!(doc.providers[1].model(), Some("gpt-4o"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let entry = ProviderEntry::Claude {
            api_key: "sk-ant-secret".to_string(),
            model: None,
            base_url: None,
            name: None,
        };
        let debug = format!("{:?}", entry);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
