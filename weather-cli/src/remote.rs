use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use weather_core::{
    AuthProvider, AuthToken, AverageWeather, CurrentWeather, ProviderError, TemperatureUnit,
    UpstreamError, WeatherProvider,
};

use crate::client::{ServiceClient, error_message, error_reply};

const SERVICE_ENDPOINT: &str = "weather service";

/// Error kind the service sends with a 400 for a zip code it has no data for.
const NOT_FOUND_KIND: &str = "not_found";

/// `WeatherProvider` backed by the weather service's HTTP API.
#[derive(Debug, Clone)]
pub struct RemoteWeatherProvider {
    client: ServiceClient,
    auth: Arc<dyn AuthProvider>,
}

impl RemoteWeatherProvider {
    pub fn new(client: ServiceClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { client, auth }
    }

    async fn send(
        &self,
        path: &str,
        token: &AuthToken,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .http()
            .get(format!("{}{}", self.client.base_url(), path))
            .bearer_auth(&token.access_token)
            .send()
            .await
    }

    /// GET `path` with the current bearer token, refreshing once on 401.
    async fn fetch<T: DeserializeOwned>(
        &self,
        zip: &str,
        path: &str,
    ) -> Result<Option<T>, ProviderError> {
        let token = self
            .auth
            .bearer_token()
            .await
            .map_err(|err| ProviderError::weather(zip, err))?
            .ok_or_else(|| ProviderError::weather(zip, anyhow!("not logged in")))?;

        let transport = |source| UpstreamError::Transport {
            endpoint: SERVICE_ENDPOINT,
            source,
        };

        let mut res = self
            .send(path, &token)
            .await
            .map_err(|err| ProviderError::weather(zip, transport(err)))?;

        if res.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("service rejected token, refreshing");
            let fresh = self
                .auth
                .refresh_token(&token)
                .await
                .map_err(|err| ProviderError::weather(zip, err))?
                .ok_or_else(|| {
                    ProviderError::weather(zip, anyhow!("session expired, log in again"))
                })?;

            res = self
                .send(path, &fresh)
                .await
                .map_err(|err| ProviderError::weather(zip, transport(err)))?;
        }

        match res.status() {
            status if status.is_success() => res
                .json::<T>()
                .await
                .map(Some)
                .map_err(|err| ProviderError::weather(zip, transport(err))),
            StatusCode::BAD_REQUEST => {
                let reply = error_reply(res).await;
                if reply.kind.as_deref() == Some(NOT_FOUND_KIND) {
                    tracing::debug!(
                        zip,
                        reason = %reply.message,
                        "service has no weather for zip code"
                    );
                    return Ok(None);
                }

                tracing::warn!(zip, reason = %reply.message, "service rejected the request");
                Err(ProviderError::weather(
                    zip,
                    UpstreamError::Status {
                        endpoint: SERVICE_ENDPOINT,
                        status: StatusCode::BAD_REQUEST,
                        body: reply.message,
                    },
                ))
            }
            status => {
                let body = error_message(res).await;
                Err(ProviderError::weather(
                    zip,
                    UpstreamError::Status {
                        endpoint: SERVICE_ENDPOINT,
                        status,
                        body,
                    },
                ))
            }
        }
    }
}

#[async_trait]
impl WeatherProvider for RemoteWeatherProvider {
    async fn current_weather(
        &self,
        zip: &str,
        unit: TemperatureUnit,
    ) -> Result<Option<CurrentWeather>, ProviderError> {
        self.fetch(zip, &format!("/v1/Weather/Current/{zip}?units={unit}")).await
    }

    async fn average_weather(
        &self,
        zip: &str,
        period_days: u32,
        unit: TemperatureUnit,
    ) -> Result<Option<AverageWeather>, ProviderError> {
        self.fetch(
            zip,
            &format!("/v1/Weather/Average/{zip}?units={unit}&timePeriod={period_days}"),
        )
        .await
    }
}
