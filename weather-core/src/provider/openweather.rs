use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::{
    aggregate::{rain_possible_today, summarize_period},
    cache::{GeocodeCache, normalize_zip},
    config::{ProviderSettings, SecretProvider},
    error::{ProviderError, UpstreamError},
    model::{
        AverageWeather, CurrentWeather, DailyForecastPoint, GeoCoordinate, TemperatureComponents,
        WeatherSnapshot,
    },
    units::TemperatureUnit,
};

use super::{Upstream, WeatherProvider};

const GEOCODE_ENDPOINT: &str = "geocode";
const ONECALL_ENDPOINT: &str = "onecall";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
    cache: GeocodeCache,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        let settings = ProviderSettings::default();
        Self {
            api_key,
            base_url: settings.base_url,
            http: Client::new(),
            cache: GeocodeCache::new(settings.cache_ttl),
        }
    }

    pub fn from_settings(
        settings: &ProviderSettings,
        secrets: &dyn SecretProvider,
    ) -> Result<Self> {
        let api_key = settings.api_key(secrets)?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http,
            cache: GeocodeCache::new(settings.cache_ttl),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the geocode cache, e.g. to share one between providers or control its clock.
    pub fn with_cache(mut self, cache: GeocodeCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Upstream<T> {
        let url = format!("{}{}", self.base_url, path);

        let res = match self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(res) => res,
            Err(source) => return Upstream::Failure(UpstreamError::Transport { endpoint, source }),
        };

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Upstream::NotFound;
        }

        let body = match res.text().await {
            Ok(body) => body,
            Err(source) => return Upstream::Failure(UpstreamError::Transport { endpoint, source }),
        };

        if !status.is_success() {
            return Upstream::Failure(UpstreamError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        match serde_json::from_str(&body) {
            Ok(parsed) => Upstream::Success(parsed),
            Err(source) => Upstream::Failure(UpstreamError::Decode { endpoint, source }),
        }
    }

    async fn fetch_geocode(&self, zip: &str) -> Upstream<GeoCoordinate> {
        let zip_query = format!("{zip},US");
        self.get_json::<OwGeocode>(
            GEOCODE_ENDPOINT,
            "/geo/1.0/zip",
            &[("zip", zip_query.as_str())],
        )
        .await
        .map(OwGeocode::into_coordinate)
    }

    async fn fetch_onecall(&self, coordinate: &GeoCoordinate) -> Upstream<WeatherSnapshot> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let parsed = self
            .get_json::<OwOneCall>(
                ONECALL_ENDPOINT,
                "/data/3.0/onecall",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("exclude", "minutely,hourly,alerts"),
                ],
            )
            .await;

        match parsed {
            Upstream::Success(payload) => match payload.into_snapshot() {
                Ok(snapshot) => Upstream::Success(snapshot),
                Err(err) => Upstream::Failure(err),
            },
            Upstream::NotFound => Upstream::NotFound,
            Upstream::Failure(err) => Upstream::Failure(err),
        }
    }

    /// Coordinates for `zip`, from the cache or the geocode endpoint.
    async fn resolve(&self, zip: &str) -> Result<Option<GeoCoordinate>, ProviderError> {
        if let Some(coordinate) = self.cache.get(zip) {
            tracing::debug!(zip, "geocode cache hit");
            return Ok(Some(coordinate));
        }

        tracing::debug!(zip, "geocode cache miss, asking upstream");
        match self.fetch_geocode(zip).await.into_result() {
            Ok(Some(coordinate)) => {
                self.cache.put(zip, coordinate.clone());
                Ok(Some(coordinate))
            }
            Ok(None) => {
                tracing::debug!(zip, "zip code not found by geocode endpoint");
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(zip, error = %err, "geocode lookup failed");
                Err(ProviderError::geocode(zip, err))
            }
        }
    }

    /// Geocode then fetch weather. `zip` is normalized once here, so the cache
    /// key, the upstream query and any error all carry the same value.
    async fn snapshot(
        &self,
        zip: &str,
    ) -> Result<Option<(GeoCoordinate, WeatherSnapshot)>, ProviderError> {
        let zip = normalize_zip(zip);
        let Some(coordinate) = self.resolve(zip).await? else {
            return Ok(None);
        };

        match self.fetch_onecall(&coordinate).await.into_result() {
            Ok(Some(snapshot)) => Ok(Some((coordinate, snapshot))),
            Ok(None) => {
                tracing::debug!(zip, "no weather data for coordinate");
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(zip, error = %err, "weather lookup failed");
                Err(ProviderError::weather(zip, err))
            }
        }
    }
}

/// Coordinates reported in results: the weather payload's echo when present.
fn result_position(coordinate: &GeoCoordinate, snapshot: &WeatherSnapshot) -> (f64, f64) {
    snapshot
        .echo
        .unwrap_or((coordinate.latitude, coordinate.longitude))
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_weather(
        &self,
        zip: &str,
        unit: TemperatureUnit,
    ) -> Result<Option<CurrentWeather>, ProviderError> {
        let Some((coordinate, snapshot)) = self.snapshot(zip).await? else {
            return Ok(None);
        };
        let (latitude, longitude) = result_position(&coordinate, &snapshot);

        Ok(Some(CurrentWeather {
            temperature: unit.convert(snapshot.current_temperature_kelvin),
            unit,
            latitude,
            longitude,
            rain_possible_today: rain_possible_today(&snapshot),
        }))
    }

    #[instrument(skip(self))]
    async fn average_weather(
        &self,
        zip: &str,
        period_days: u32,
        unit: TemperatureUnit,
    ) -> Result<Option<AverageWeather>, ProviderError> {
        let Some((coordinate, snapshot)) = self.snapshot(zip).await? else {
            return Ok(None);
        };
        let (latitude, longitude) = result_position(&coordinate, &snapshot);

        // An empty window would average to NaN.
        let window = period_days.max(1) as usize;
        let summary = summarize_period(&snapshot.daily, window).ok_or_else(|| {
            ProviderError::weather(
                normalize_zip(zip),
                UpstreamError::Payload {
                    endpoint: ONECALL_ENDPOINT,
                    reason: "no daily forecast to average".to_string(),
                },
            )
        })?;

        if summary.days < window {
            tracing::debug!(
                zip,
                requested = window,
                available = summary.days,
                "short forecast window"
            );
        }

        Ok(Some(AverageWeather {
            average_temperature: unit.convert(summary.mean_kelvin),
            unit,
            latitude,
            longitude,
            rain_possible_in_period: summary.rain_possible,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeocode {
    name: Option<String>,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

impl OwGeocode {
    fn into_coordinate(self) -> GeoCoordinate {
        GeoCoordinate {
            latitude: self.lat,
            longitude: self.lon,
            name: self.name,
            country: self.country,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    morn: f64,
    day: f64,
    eve: f64,
    night: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    rain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwOneCall {
    lat: Option<f64>,
    lon: Option<f64>,
    current: OwCurrent,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

impl OwOneCall {
    fn into_snapshot(self) -> Result<WeatherSnapshot, UpstreamError> {
        let daily = self
            .daily
            .into_iter()
            .map(|day| {
                Ok(DailyForecastPoint {
                    date: unix_to_utc_date(day.dt)?,
                    temperature: TemperatureComponents {
                        morning: day.temp.morn,
                        day: day.temp.day,
                        evening: day.temp.eve,
                        night: day.temp.night,
                    },
                    rain: day.rain,
                })
            })
            .collect::<Result<Vec<_>, UpstreamError>>()?;

        Ok(WeatherSnapshot {
            echo: self.lat.zip(self.lon),
            current_temperature_kelvin: self.current.temp,
            current_report_date: unix_to_utc_date(self.current.dt)?,
            daily,
        })
    }
}

fn unix_to_utc_date(ts: i64) -> Result<NaiveDate, UpstreamError> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| UpstreamError::Payload {
            endpoint: ONECALL_ENDPOINT,
            reason: format!("timestamp {ts} is out of range"),
        })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onecall_payload_becomes_snapshot() {
        let payload: OwOneCall = serde_json::from_value(serde_json::json!({
            "lat": 40.75,
            "lon": -73.99,
            "current": { "dt": 1_717_243_200, "temp": 295.5 },
            "daily": [
                {
                    "dt": 1_717_243_200,
                    "temp": { "day": 296.0, "morn": 290.0, "eve": 294.0, "night": 288.0 },
                    "rain": 1.2
                },
                {
                    "dt": 1_717_329_600,
                    "temp": { "day": 297.0, "morn": 291.0, "eve": 295.0, "night": 289.0 }
                }
            ]
        }))
        .unwrap();

        let snapshot = payload.into_snapshot().unwrap();
        assert_eq!(snapshot.echo, Some((40.75, -73.99)));
        assert_eq!(snapshot.current_report_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(snapshot.daily.len(), 2);
        assert_eq!(snapshot.daily[0].rain, Some(1.2));
        assert_eq!(snapshot.daily[1].rain, None);
        assert_eq!(snapshot.daily[1].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn partial_echo_is_ignored() {
        let payload: OwOneCall = serde_json::from_value(serde_json::json!({
            "lat": 40.75,
            "current": { "dt": 1_717_243_200, "temp": 295.5 }
        }))
        .unwrap();

        let snapshot = payload.into_snapshot().unwrap();
        assert_eq!(snapshot.echo, None);
        assert!(snapshot.daily.is_empty());
    }

    #[test]
    fn date_is_taken_in_utc() {
        // 2024-06-01T23:30:00Z
        assert_eq!(
            unix_to_utc_date(1_717_284_600).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
