//! Supported language-model providers.
//!
//! Every per-provider fact (display label, wire id, default model, credential
//! key) lives in a single table so the mapping cannot drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown provider '{0}' (expected one of: openai, google_genai, anthropic, mistralai)")]
pub struct ParseProviderError(pub String);

/// A language-model vendor the digest can be generated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    #[default]
    OpenAi,
    Gemini,
    Anthropic,
    Mistral,
}

/// Static facts about one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub provider: Provider,
    /// Label shown in the provider selector
    pub label: &'static str,
    /// Stable identifier used in config files and on the command line
    pub id: &'static str,
    /// Model name pre-filled when this provider is selected
    pub default_model: &'static str,
    /// Environment key that holds this provider's API key
    pub credential_key: &'static str,
}

static PROVIDERS: [ProviderSpec; 4] = [
    ProviderSpec {
        provider: Provider::OpenAi,
        label: "OpenAI",
        id: "openai",
        default_model: "gpt-4o-mini",
        credential_key: "OPENAI_API_KEY",
    },
    ProviderSpec {
        provider: Provider::Gemini,
        label: "Gemini (Google)",
        id: "google_genai",
        default_model: "gemini-2.0-flash",
        credential_key: "GOOGLE_API_KEY",
    },
    ProviderSpec {
        provider: Provider::Anthropic,
        label: "Anthropic (Claude)",
        id: "anthropic",
        default_model: "claude-3-haiku-20240307",
        credential_key: "ANTHROPIC_API_KEY",
    },
    ProviderSpec {
        provider: Provider::Mistral,
        label: "Mistral",
        id: "mistralai",
        default_model: "mistral-large-latest",
        credential_key: "MISTRAL_API_KEY",
    },
];

impl Provider {
    /// All providers, in selector order
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::Gemini,
        Provider::Anthropic,
        Provider::Mistral,
    ];

    /// The table of every provider, in selector order
    pub fn table() -> &'static [ProviderSpec] {
        &PROVIDERS
    }

    pub fn spec(self) -> &'static ProviderSpec {
        // Table order matches the enum declaration order.
        &PROVIDERS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }

    pub fn default_model(self) -> &'static str {
        self.spec().default_model
    }

    pub fn credential_key(self) -> &'static str {
        self.spec().credential_key
    }

    /// Position of this provider in the selector
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROVIDERS
            .iter()
            .find(|spec| spec.id == s)
            .map(|spec| spec.provider)
            .ok_or_else(|| ParseProviderError(s.to_string()))
    }
}

impl TryFrom<String> for Provider {
    type Error = ParseProviderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum() {
        for (index, provider) in Provider::ALL.iter().enumerate() {
            assert_eq!(provider.spec().provider, *provider);
            assert_eq!(provider.index(), index);
        }
    }

    #[test]
    fn default_models_and_credential_keys() {
        let expected = [
            ("OpenAI", "openai", "gpt-4o-mini", "OPENAI_API_KEY"),
            ("Gemini (Google)", "google_genai", "gemini-2.0-flash", "GOOGLE_API_KEY"),
            (
                "Anthropic (Claude)",
                "anthropic",
                "claude-3-haiku-20240307",
                "ANTHROPIC_API_KEY",
            ),
            ("Mistral", "mistralai", "mistral-large-latest", "MISTRAL_API_KEY"),
        ];

        for (provider, (label, id, model, key)) in Provider::ALL.iter().zip(expected) {
            assert_eq!(provider.label(), label);
            assert_eq!(provider.id(), id);
            assert_eq!(provider.default_model(), model);
            assert_eq!(provider.credential_key(), key);
        }
    }

    #[test]
    fn parses_ids() {
        assert_eq!("google_genai".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!("mistralai".parse::<Provider>(), Ok(Provider::Mistral));
        assert_eq!(
            "gemini".parse::<Provider>(),
            Err(ParseProviderError("gemini".to_string()))
        );
    }

    #[test]
    fn serializes_as_id() {
        let json = serde_json::to_string(&Provider::Anthropic).unwrap();
        assert_eq!(json, "\"anthropic\"");
        let back: Provider = serde_json::from_str("\"mistralai\"").unwrap();
        assert_eq!(back, Provider::Mistral);
    }
}
