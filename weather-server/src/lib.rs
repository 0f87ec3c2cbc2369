//! HTTP API for ZIP code weather.
//!
//! Routes:
//! - `POST /register`, `POST /login`, `POST /refresh` for bearer tokens
//! - `GET /v1/Weather/Current/{zip}?units=C|F`
//! - `GET /v1/Weather/Average/{zip}?units=C|F&timePeriod=2..5`

use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod validation;
pub mod weather;

pub use auth::TokenIssuer;
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/v1/Weather/Current/{zip}", get(weather::current))
        .route("/v1/Weather/Average/{zip}", get(weather::average))
        .with_state(state)
}
