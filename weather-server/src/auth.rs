//! Minimal account and opaque bearer-token issuing for the weather API.
//!
//! Accounts and tokens live in memory only; a restart logs everyone out.

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use weather_core::AuthToken;

use crate::{error::ApiError, state::AppState, validation};

#[derive(Debug, Clone)]
struct Account {
    salt: String,
    digest: String,
}

/// Owner and expiry of an issued token, access or refresh.
#[derive(Debug, Clone)]
struct Grant {
    email: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct TokenIssuer {
    accounts: DashMap<String, Account>,
    /// access token -> grant
    sessions: DashMap<String, Grant>,
    /// refresh token -> grant
    refresh_tokens: DashMap<String, Grant>,
    lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(lifetime: Duration, refresh_lifetime: Duration) -> Self {
        Self {
            accounts: DashMap::new(),
            sessions: DashMap::new(),
            refresh_tokens: DashMap::new(),
            lifetime,
            refresh_lifetime,
        }
    }

    pub fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        validation::credentials(email, password)?;
        let key = email.to_lowercase();

        match self.accounts.entry(key) {
            Entry::Occupied(_) => Err(ApiError::Conflict(email.to_string())),
            Entry::Vacant(slot) => {
                let salt = Uuid::new_v4().simple().to_string();
                let digest = password_digest(&salt, password);
                slot.insert(Account { salt, digest });
                tracing::info!(email, "registered account");
                Ok(())
            }
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let key = email.to_lowercase();
        let verified = self
            .accounts
            .get(&key)
            .is_some_and(|account| password_digest(&account.salt, password) == account.digest);

        if !verified {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(self.issue(key, Utc::now()))
    }

    /// Rotate a refresh token. The old refresh token stops working.
    pub fn refresh(&self, refresh_token: &str) -> Result<AuthToken, ApiError> {
        self.refresh_at(refresh_token, Utc::now())
    }

    pub fn refresh_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthToken, ApiError> {
        let (_, grant) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(ApiError::Unauthorized)?;

        if now >= grant.expires_at {
            tracing::debug!(email = %grant.email, "refresh token expired");
            return Err(ApiError::Unauthorized);
        }
        Ok(self.issue(grant.email, now))
    }

    /// Email of the account owning `access_token`, if the token is live.
    pub fn authenticate(&self, access_token: &str) -> Option<String> {
        self.authenticate_at(access_token, Utc::now())
    }

    pub fn authenticate_at(&self, access_token: &str, now: DateTime<Utc>) -> Option<String> {
        let session = self.sessions.get(access_token)?.clone();
        if now >= session.expires_at {
            self.sessions.remove(access_token);
            return None;
        }
        Some(session.email)
    }

    fn issue(&self, email: String, now: DateTime<Utc>) -> AuthToken {
        self.prune(now);

        let access = Uuid::new_v4().simple().to_string();
        let refresh = Uuid::new_v4().simple().to_string();

        self.sessions.insert(
            access.clone(),
            Grant {
                email: email.clone(),
                expires_at: now + self.lifetime,
            },
        );
        self.refresh_tokens.insert(
            refresh.clone(),
            Grant {
                email,
                expires_at: now + self.refresh_lifetime,
            },
        );

        AuthToken::bearer(access, refresh, self.lifetime.num_seconds())
    }

    /// Drop every expired access and refresh token.
    fn prune(&self, now: DateTime<Utc>) {
        self.sessions.retain(|_, session| now < session.expires_at);
        self.refresh_tokens.retain(|_, grant| now < grant.expires_at);
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let email = state
            .tokens
            .authenticate(token)
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser { email })
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(), ApiError> {
    state.tokens.register(body.email.trim(), &body.password)
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<AuthToken>, ApiError> {
    state.tokens.login(body.email.trim(), &body.password).map(Json)
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthToken>, ApiError> {
    state.tokens.refresh(&body.refresh_token).map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Duration::hours(1), Duration::days(1))
    }

    #[test]
    fn register_then_login() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();

        let token = issuer.login("User@Example.com", "hunter22").unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(
            issuer.authenticate(&token.access_token).as_deref(),
            Some("user@example.com")
        );
    }

    #[test]
    fn duplicate_registration_conflicts() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        let err = issuer.register("USER@example.com", "other-pass").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn wrong_password_or_unknown_account() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        assert!(matches!(
            issuer.login("user@example.com", "nope!!"),
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            issuer.login("ghost@example.com", "hunter22"),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn refresh_rotates_tokens() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        let first = issuer.login("user@example.com", "hunter22").unwrap();

        let second = issuer.refresh(&first.refresh_token).unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert!(issuer.authenticate(&second.access_token).is_some());
        assert!(matches!(issuer.refresh(&first.refresh_token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn access_tokens_expire() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        let token = issuer.login("user@example.com", "hunter22").unwrap();

        let later = Utc::now() + Duration::hours(2);
        assert!(issuer.authenticate_at(&token.access_token, later).is_none());
        assert!(issuer.authenticate(&token.access_token).is_none(), "expired session is dropped");
    }

    #[test]
    fn refresh_tokens_expire() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        let token = issuer.login("user@example.com", "hunter22").unwrap();

        let later = Utc::now() + Duration::days(2);
        assert!(matches!(
            issuer.refresh_at(&token.refresh_token, later),
            Err(ApiError::Unauthorized)
        ));
        assert!(issuer.refresh_tokens.is_empty());
    }

    #[test]
    fn refresh_within_lifetime_outlives_access_token() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        let token = issuer.login("user@example.com", "hunter22").unwrap();

        let later = Utc::now() + Duration::hours(3);
        let renewed = issuer.refresh_at(&token.refresh_token, later).unwrap();
        assert!(issuer.authenticate_at(&renewed.access_token, later).is_some());
    }

    #[test]
    fn issuing_prunes_expired_tokens() {
        let issuer = issuer();
        issuer.register("user@example.com", "hunter22").unwrap();
        for _ in 0..5 {
            issuer.login("user@example.com", "hunter22").unwrap();
        }
        assert_eq!(issuer.sessions.len(), 5);
        assert_eq!(issuer.refresh_tokens.len(), 5);

        // Access tokens are gone after an hour, refresh tokens after a day.
        issuer.issue("user@example.com".to_string(), Utc::now() + Duration::hours(2));
        assert_eq!(issuer.sessions.len(), 1);
        assert_eq!(issuer.refresh_tokens.len(), 6);

        issuer.issue("user@example.com".to_string(), Utc::now() + Duration::days(2));
        assert_eq!(issuer.sessions.len(), 1);
        assert_eq!(issuer.refresh_tokens.len(), 1);
    }

    #[test]
    fn salts_differ_per_account() {
        assert_ne!(password_digest("a", "same"), password_digest("b", "same"));
    }
}
