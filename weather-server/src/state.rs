use std::sync::Arc;
use weather_core::WeatherProvider;

use crate::auth::TokenIssuer;

#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>, tokens: TokenIssuer) -> Self {
        Self {
            provider,
            tokens: Arc::new(tokens),
        }
    }
}
