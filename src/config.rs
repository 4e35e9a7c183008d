//! Configuration loading and management for newsdigest.
//!
//! Loads settings from `newsdigest.toml` with environment variable overrides for sensitive data.

use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment key holding the search service API key
pub const SEARCH_CREDENTIAL_KEY: &str = "TAVILY_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// An API key. Never shown in `Debug` or `Display` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for placing in a request header
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

/// LLM provider defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Provider preselected in the selector
    #[serde(default)]
    pub provider: Provider,
    /// Model identifier overriding the provider's default model
    #[serde(default)]
    pub model: Option<String>,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub tavily_key: Option<Credential>,
    #[serde(default)]
    pub openai_key: Option<Credential>,
    #[serde(default)]
    pub google_key: Option<Credential>,
    #[serde(default)]
    pub anthropic_key: Option<Credential>,
    #[serde(default)]
    pub mistral_key: Option<Credential>,
}

/// Base URLs of the external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_openai_endpoint")]
    pub openai: String,
    #[serde(default = "default_google_endpoint")]
    pub google_genai: String,
    #[serde(default = "default_anthropic_endpoint")]
    pub anthropic: String,
    #[serde(default = "default_mistral_endpoint")]
    pub mistralai: String,
    #[serde(default = "default_tavily_endpoint")]
    pub tavily: String,
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com".to_string()
}
fn default_google_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_mistral_endpoint() -> String {
    "https://api.mistral.ai".to_string()
}
fn default_tavily_endpoint() -> String {
    "https://api.tavily.com".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_endpoint(),
            google_genai: default_google_endpoint(),
            anthropic: default_anthropic_endpoint(),
            mistralai: default_mistral_endpoint(),
            tavily: default_tavily_endpoint(),
        }
    }
}

impl EndpointConfig {
    /// Base URL for a model provider
    pub fn for_provider(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Gemini => &self.google_genai,
            Provider::Anthropic => &self.anthropic,
            Provider::Mistral => &self.mistralai,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl Config {
    /// Load configuration from the default location (newsdigest.toml in cwd or home).
    ///
    /// Falls back to built-in defaults when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env(|key| std::env::var(key).ok());
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override API keys from environment variables. Empty values are ignored.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(Credential::from);

        if let Some(key) = read(SEARCH_CREDENTIAL_KEY) {
            self.api.tavily_key = Some(key);
        }
        for provider in Provider::ALL {
            if let Some(key) = read(provider.credential_key()) {
                *self.api.slot_mut(provider) = Some(key);
            }
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("newsdigest.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("newsdigest")
            .join("newsdigest.toml");
        home_config.exists().then_some(home_config)
    }

    /// Get the stored API key for a provider, if any
    pub fn api_key(&self, provider: Provider) -> Option<&Credential> {
        self.api.slot(provider).as_ref().filter(|key| !key.is_empty())
    }

    /// Get the search service API key, if any
    pub fn search_key(&self) -> Option<&Credential> {
        self.api.tavily_key.as_ref().filter(|key| !key.is_empty())
    }

    /// Model name to pre-fill for a provider: the configured override when it
    /// applies to the configured provider, otherwise the provider default.
    pub fn model_for(&self, provider: Provider) -> String {
        match &self.agent.model {
            Some(model) if provider == self.agent.provider => model.clone(),
            _ => provider.default_model().to_string(),
        }
    }
}

impl ApiConfig {
    fn slot(&self, provider: Provider) -> &Option<Credential> {
        match provider {
            Provider::OpenAi => &self.openai_key,
            Provider::Gemini => &self.google_key,
            Provider::Anthropic => &self.anthropic_key,
            Provider::Mistral => &self.mistral_key,
        }
    }

    fn slot_mut(&mut self, provider: Provider) -> &mut Option<Credential> {
        match provider {
            Provider::OpenAi => &mut self.openai_key,
            Provider::Gemini => &mut self.google_key,
            Provider::Anthropic => &mut self.anthropic_key,
            Provider::Mistral => &mut self.mistral_key,
        }
    }
}

/// The four values gathered from the operator for a single run.
///
/// Built fresh for every run and dropped when the run finishes.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub provider: Provider,
    pub credential: Credential,
    pub model_name: String,
    pub topic: String,
}

impl RunConfig {
    pub fn new(
        provider: Provider,
        credential: impl Into<Credential>,
        model_name: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            credential: credential.into(),
            model_name: model_name.into(),
            topic: topic.into(),
        }
    }

    /// A run may proceed only with a credential and a non-blank topic
    pub fn is_complete(&self) -> bool {
        !self.credential.is_empty() && !self.topic.trim().is_empty()
    }
}

/// Pick the credential for a one-shot run: the `--api-key` value, or the
/// stored key for the provider when no flag was given. The interactive
/// session never falls back; it uses the key exactly as typed.
pub fn resolve_credential(
    explicit: Option<String>,
    provider: Provider,
    config: &Config,
) -> Credential {
    match explicit.filter(|value| !value.is_empty()) {
        Some(value) => Credential::new(value),
        None => config.api_key(provider).cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn credential_is_redacted() {
        let key = Credential::new("sk-very-secret");
        assert_eq!(format!("{:?}", key), "Credential(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "sk-very-secret");
    }

    #[test]
    fn parses_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
provider = "anthropic"
model = "claude-3-5-sonnet-latest"

[endpoints]
anthropic = "http://localhost:9000"
"#
        )
        .unwrap();

        let config = Config::parse_file(file.path()).unwrap();
        assert_eq!(config.agent.provider, Provider::Anthropic);
        assert_eq!(config.model_for(Provider::Anthropic), "claude-3-5-sonnet-latest");
        assert_eq!(config.model_for(Provider::OpenAi), "gpt-4o-mini");
        assert_eq!(
            config.endpoints.for_provider(Provider::Anthropic),
            "http://localhost:9000"
        );
        assert_eq!(
            config.endpoints.for_provider(Provider::OpenAi),
            "https://api.openai.com"
        );
        assert_eq!(config.endpoints.tavily, "https://api.tavily.com");
    }

    #[test]
    fn rejects_unknown_provider() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\nprovider = \"cohere\"").unwrap();

        let err = Config::parse_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn environment_overrides_keys() {
        let vars = env(&[
            ("TAVILY_API_KEY", "tvly-123"),
            ("GOOGLE_API_KEY", "g-456"),
            ("MISTRAL_API_KEY", ""),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).cloned());

        assert_eq!(config.search_key().map(Credential::expose), Some("tvly-123"));
        assert_eq!(
            config.api_key(Provider::Gemini).map(Credential::expose),
            Some("g-456")
        );
        assert!(config.api_key(Provider::Mistral).is_none());
        assert!(config.api_key(Provider::OpenAi).is_none());
    }

    #[test]
    fn explicit_credential_wins() {
        let mut config = Config::default();
        config.api.openai_key = Some(Credential::new("from-env"));

        let explicit = resolve_credential(Some("typed".into()), Provider::OpenAi, &config);
        assert_eq!(explicit.expose(), "typed");

        let fallback = resolve_credential(Some(String::new()), Provider::OpenAi, &config);
        assert_eq!(fallback.expose(), "from-env");

        let none = resolve_credential(None, Provider::Anthropic, &config);
        assert!(none.is_empty());
    }

    #[test]
    fn run_config_completeness() {
        assert!(RunConfig::new(Provider::OpenAi, "sk-test", "gpt-4o-mini", "AI News").is_complete());
        assert!(!RunConfig::new(Provider::OpenAi, "", "gpt-4o-mini", "AI News").is_complete());
        assert!(!RunConfig::new(Provider::OpenAi, "sk-test", "gpt-4o-mini", "   ").is_complete());
    }
}
