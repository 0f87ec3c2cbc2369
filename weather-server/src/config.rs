use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::Path};
use weather_core::{
    ProviderSettings,
    cache::DEFAULT_GEOCODE_TTL_SECS,
    config::{
        DEFAULT_OPENWEATHER_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, OPENWEATHER_API_KEY_SECRET,
    },
};

/// Server settings, read from an optional TOML file.
///
/// Example TOML:
/// bind = "0.0.0.0:8080"
/// cache_ttl_secs = 86400
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub openweather_base_url: String,
    /// Name of the environment variable holding the OpenWeather key.
    pub api_key_secret: String,
    pub cache_ttl_secs: i64,
    pub request_timeout_secs: u64,
    pub token_lifetime_secs: i64,
    pub refresh_token_lifetime_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            api_key_secret: OPENWEATHER_API_KEY_SECRET.to_string(),
            cache_ttl_secs: DEFAULT_GEOCODE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_lifetime_secs: 3600,
            refresh_token_lifetime_secs: 7 * 24 * 3600,
        }
    }
}

impl ServerConfig {
    /// Load from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.openweather_base_url.clone(),
            api_key_secret: self.api_key_secret.clone(),
            cache_ttl: Duration::seconds(self.cache_ttl_secs),
            request_timeout: std::time::Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::seconds(self.token_lifetime_secs)
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::seconds(self.refresh_token_lifetime_secs)
    }
}
