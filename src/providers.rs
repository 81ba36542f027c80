//! # Provider Registry
//!
//! Maps a chat provider key to the OpenAI-compatible endpoint that serves it
//! and the model used when the caller does not name one. Adding a provider
//! means adding a variant and a registry entry; no call site branches on the
//! provider itself.

use std::collections::HashMap;

use crate::config::Config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Provider {
    #[default]
    OpenAI,
    DeepSeek,
}

impl Provider {
    /// Parse the caller's `provider` field. Only known keys select an
    /// alternate provider; anything else falls back to the default.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("deepseek") => Self::DeepSeek,
            _ => Self::OpenAI,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::DeepSeek => "deepseek",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub default_model: String,
}

impl ProviderEndpoint {
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
        }
    }

    /// Requested model, or this endpoint's default when none was given.
    pub fn model_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.default_model)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    fallback: ProviderEndpoint,
    entries: HashMap<Provider, ProviderEndpoint>,
}

impl ProviderRegistry {
    pub fn from_config(config: &Config) -> Self {
        let fallback = ProviderEndpoint::new(&config.openai_base_url, &config.openai_default_model);
        let mut entries = HashMap::new();
        entries.insert(Provider::OpenAI, fallback.clone());
        entries.insert(
            Provider::DeepSeek,
            ProviderEndpoint::new(&config.deepseek_base_url, &config.deepseek_default_model),
        );
        Self { fallback, entries }
    }

    /// Registry pointing every provider at a single base URL. Used by tests
    /// that stand up one mock server.
    pub fn single(base_url: &str) -> Self {
        let fallback = ProviderEndpoint::new(base_url, "gpt-4o-mini");
        let mut entries = HashMap::new();
        entries.insert(Provider::OpenAI, fallback.clone());
        entries.insert(Provider::DeepSeek, ProviderEndpoint::new(base_url, "deepseek-chat"));
        Self { fallback, entries }
    }

    /// Endpoint for `provider`, falling back to the default provider's entry.
    pub fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        self.entries.get(&provider).unwrap_or(&self.fallback)
    }
}
