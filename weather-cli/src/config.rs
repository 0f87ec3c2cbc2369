use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8080";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// service_url = "https://weather.example.com"
/// email = "me@example.com"
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the weather service API.
    pub service_url: Option<String>,

    /// Email used for the last successful login, offered as the default next time.
    pub email: Option<String>,
}

impl Config {
    pub fn service_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL)
    }

    /// Validate and store the service base URL.
    pub fn set_service_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid service URL '{url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Service URL must use http or https, got '{}'", parsed.scheme()));
        }

        self.service_url = Some(url.trim_end_matches('/').to_string());
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the stored login token.
    pub fn credentials_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("credentials.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "zip-weather", "weather-cli")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_url_defaults_to_localhost() {
        let cfg = Config::default();
        assert_eq!(cfg.service_url(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn set_service_url_strips_trailing_slash() {
        let mut cfg = Config::default();
        cfg.set_service_url("https://weather.example.com/").unwrap();
        assert_eq!(cfg.service_url(), "https://weather.example.com");
    }

    #[test]
    fn set_service_url_rejects_garbage() {
        let mut cfg = Config::default();
        assert!(cfg.set_service_url("not a url").is_err());
        assert!(cfg.set_service_url("ftp://weather.example.com").is_err());
        assert_eq!(cfg.service_url, None);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_service_url("http://localhost:9000").unwrap();
        cfg.email = Some("me@example.com".into());
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }
}
