//! HTTP client for the service's account endpoints and the session that keeps
//! the stored token fresh.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use weather_core::{AuthProvider, AuthToken, CredentialStore, StoredToken};

/// Refresh a little before the server would start rejecting the token.
const REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    http: Client,
}

impl ServiceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        let res = self
            .http
            .post(self.url("/register"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send registration request to the weather service")?;

        if !res.status().is_success() {
            return Err(anyhow!("Registration failed: {}", error_message(res).await));
        }
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let res = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send login request to the weather service")?;

        if !res.status().is_success() {
            return Err(anyhow!("Login failed: {}", error_message(res).await));
        }
        res.json().await.context("Failed to parse login response")
    }

    /// `None` when the service no longer accepts `refresh_token`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<AuthToken>> {
        let res = self
            .http
            .post(self.url("/refresh"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .context("Failed to send token refresh request to the weather service")?;

        match res.status() {
            StatusCode::UNAUTHORIZED => Ok(None),
            status if status.is_success() => res
                .json()
                .await
                .map(Some)
                .context("Failed to parse token refresh response"),
            _ => Err(anyhow!("Token refresh failed: {}", error_message(res).await)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    kind: Option<String>,
}

/// Decoded error response: the service's reason and, when sent, its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    pub kind: Option<String>,
    pub message: String,
}

pub async fn error_reply(res: Response) -> ErrorReply {
    let status = res.status();
    let (kind, message) = match res.text().await {
        Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (parsed.kind, parsed.error),
            Err(_) if body.trim().is_empty() => (None, status.to_string()),
            Err(_) => (None, format!("{status}: {}", body.trim())),
        },
        Err(_) => (None, status.to_string()),
    };
    ErrorReply { kind, message }
}

/// Human-readable reason from an error response.
pub async fn error_message(res: Response) -> String {
    error_reply(res).await.message
}

/// Bearer tokens backed by a credential store, refreshed through the service.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    client: ServiceClient,
    store: Arc<dyn CredentialStore>,
}

impl SessionAuth {
    pub fn new(client: ServiceClient, store: Arc<dyn CredentialStore>) -> Self {
        Self { client, store }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let token = self.client.login(email, password).await?;
        self.store.save(&StoredToken::new(token.clone(), Utc::now()))?;
        tracing::info!(email, "logged in");
        Ok(token)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear()
    }
}

#[async_trait]
impl AuthProvider for SessionAuth {
    async fn bearer_token(&self) -> Result<Option<AuthToken>> {
        let Some(stored) = self.store.get()? else {
            return Ok(None);
        };

        if stored.needs_refresh(Utc::now(), Duration::seconds(REFRESH_MARGIN_SECS)) {
            tracing::debug!("stored token expired, refreshing");
            return self.refresh_token(&stored.token).await;
        }
        Ok(Some(stored.token))
    }

    async fn refresh_token(&self, token: &AuthToken) -> Result<Option<AuthToken>> {
        match self.client.refresh(&token.refresh_token).await? {
            Some(fresh) => {
                self.store.save(&StoredToken::new(fresh.clone(), Utc::now()))?;
                Ok(Some(fresh))
            }
            None => {
                tracing::debug!("refresh token rejected, clearing stored credentials");
                self.store.clear()?;
                Ok(None)
            }
        }
    }
}
