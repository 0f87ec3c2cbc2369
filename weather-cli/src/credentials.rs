use anyhow::{Context, Result};
use std::{fs, io::ErrorKind, path::PathBuf};
use weather_core::{CredentialStore, StoredToken};

/// Keeps the logged-in token as JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create credentials directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(token).context("Failed to serialize token")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write credentials file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).with_context(|| {
                format!("Failed to restrict credentials file: {}", self.path.display())
            })?;
        }

        tracing::debug!(path = %self.path.display(), "stored credentials");
        Ok(())
    }

    fn get(&self) -> Result<Option<StoredToken>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read credentials file: {}", self.path.display())
                });
            }
        };

        let token = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse credentials file: {}", self.path.display()))?;
        Ok(Some(token))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to remove credentials file: {}", self.path.display())
            }),
        }
    }
}
