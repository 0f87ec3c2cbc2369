use anyhow::{Result, anyhow};
use chrono::Duration;
use std::{collections::HashMap, fmt::Debug};

use crate::cache::DEFAULT_GEOCODE_TTL_SECS;

pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const OPENWEATHER_API_KEY_SECRET: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Where secrets such as upstream API keys come from.
pub trait SecretProvider: Send + Sync + Debug {
    fn get_secret(&self, name: &str) -> Option<String>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn get_secret(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.trim().is_empty())
    }
}

/// Fixed secrets, handy for tests and for embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets(HashMap<String, String>);

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl SecretProvider for StaticSecrets {
    fn get_secret(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Settings for the OpenWeather-backed provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Scheme and host of the upstream, without a trailing path.
    pub base_url: String,
    /// Name of the secret holding the upstream API key.
    pub api_key_secret: String,
    pub cache_ttl: Duration,
    pub request_timeout: std::time::Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            api_key_secret: OPENWEATHER_API_KEY_SECRET.to_string(),
            cache_ttl: Duration::seconds(DEFAULT_GEOCODE_TTL_SECS),
            request_timeout: std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ProviderSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up the upstream API key through `secrets`.
    pub fn api_key(&self, secrets: &dyn SecretProvider) -> Result<String> {
        secrets.get_secret(&self.api_key_secret).ok_or_else(|| {
            anyhow!(
                "No API key configured for OpenWeather.\n\
                 Hint: set the `{}` secret.",
                self.api_key_secret
            )
        })
    }
}
