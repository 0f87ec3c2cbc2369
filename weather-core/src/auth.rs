//! Contracts for the bearer-token collaborator shared by the service and the CLI.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Token pair as issued by the service's `/login` and `/refresh` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

impl AuthToken {
    pub fn bearer(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            access_token: access_token.into(),
            expires_in,
            refresh_token: refresh_token.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// A token together with the moment it was received, so expiry can be judged later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: AuthToken,
    pub issued_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(token: AuthToken, issued_at: DateTime<Utc>) -> Self {
        Self { token, issued_at }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.token.expires_in)
    }

    /// Expired, or expiring within `margin`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at()
    }
}

/// Hands out bearer tokens to the weather-fetch path.
#[async_trait]
pub trait AuthProvider: Send + Sync + Debug {
    /// Current usable token, or `None` when the user is not logged in.
    async fn bearer_token(&self) -> Result<Option<AuthToken>>;

    /// Exchange `token` for a fresh one. `None` when the refresh is rejected.
    async fn refresh_token(&self, token: &AuthToken) -> Result<Option<AuthToken>>;
}

/// Local persistence for the logged-in user's token.
pub trait CredentialStore: Send + Sync + Debug {
    fn save(&self, token: &StoredToken) -> Result<()>;
    fn get(&self) -> Result<Option<StoredToken>>;
    fn clear(&self) -> Result<()>;
}
