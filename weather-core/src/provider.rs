use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::{ProviderSettings, SecretProvider},
    error::{ProviderError, UpstreamError},
    model::{AverageWeather, CurrentWeather},
    provider::openweather::OpenWeatherProvider,
    units::TemperatureUnit,
};

pub mod openweather;

/// Weather lookups by ZIP code.
///
/// `Ok(None)` means the upstream has no data for the ZIP code (unknown ZIP or no
/// weather for its coordinate). Any other upstream failure is a [`ProviderError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        zip: &str,
        unit: TemperatureUnit,
    ) -> Result<Option<CurrentWeather>, ProviderError>;

    /// Average over the first `period_days` forecast days (fewer if the upstream has fewer).
    async fn average_weather(
        &self,
        zip: &str,
        period_days: u32,
        unit: TemperatureUnit,
    ) -> Result<Option<AverageWeather>, ProviderError>;
}

/// Outcome of one upstream call.
#[derive(Debug)]
pub enum Upstream<T> {
    Success(T),
    NotFound,
    Failure(UpstreamError),
}

impl<T> Upstream<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Upstream<U> {
        match self {
            Upstream::Success(value) => Upstream::Success(f(value)),
            Upstream::NotFound => Upstream::NotFound,
            Upstream::Failure(err) => Upstream::Failure(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Upstream::NotFound)
    }

    /// Collapse into the provider's `Result<Option<_>>` shape.
    pub fn into_result(self) -> Result<Option<T>, UpstreamError> {
        match self {
            Upstream::Success(value) => Ok(Some(value)),
            Upstream::NotFound => Ok(None),
            Upstream::Failure(err) => Err(err),
        }
    }
}

/// Construct the OpenWeather-backed provider, reading its API key through `secrets`.
pub fn provider_from_settings(
    settings: &ProviderSettings,
    secrets: &dyn SecretProvider,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::from_settings(settings, secrets)?;
    Ok(Arc::new(provider))
}
