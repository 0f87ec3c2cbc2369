//! Core library for the ZIP code weather service.
//!
//! This crate defines:
//! - The `WeatherProvider` contract and its OpenWeather-backed implementation
//! - The in-memory geocode cache
//! - Kelvin unit conversion and forecast aggregation
//! - Contracts for the bearer-token collaborator (`AuthProvider`, `CredentialStore`)
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod aggregate;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod units;

pub use auth::{AuthProvider, AuthToken, CredentialStore, StoredToken};
pub use cache::{Clock, GeocodeCache, SystemClock};
pub use config::{EnvSecrets, ProviderSettings, SecretProvider, StaticSecrets};
pub use error::{ProviderError, ProviderStage, UnitError, UpstreamError};
pub use model::{AverageWeather, CurrentWeather, GeoCoordinate};
pub use provider::{Upstream, WeatherProvider, openweather::OpenWeatherProvider};
pub use units::{TemperatureUnit, convert_kelvin, convert_kelvin_to_unit};
