use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use weather_core::{AverageWeather, CurrentWeather};

use crate::{auth::AuthUser, error::ApiError, state::AppState, validation};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherQuery {
    pub units: Option<String>,
    pub time_period: Option<String>,
}

pub async fn current(
    user: AuthUser,
    State(state): State<AppState>,
    Path(zip): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let zip = validation::zip_code(&zip)?;
    let unit = validation::units(query.units.as_deref())?;
    tracing::debug!(user = %user.email, zip, %unit, "current weather request");

    state
        .provider
        .current_weather(zip, unit)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(zip.to_string()))
}

pub async fn average(
    user: AuthUser,
    State(state): State<AppState>,
    Path(zip): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<AverageWeather>, ApiError> {
    let zip = validation::zip_code(&zip)?;
    let unit = validation::units(query.units.as_deref())?;
    let days = validation::time_period(query.time_period.as_deref())?;
    tracing::debug!(user = %user.email, zip, %unit, days, "average weather request");

    state
        .provider
        .average_weather(zip, days, unit)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(zip.to_string()))
}
