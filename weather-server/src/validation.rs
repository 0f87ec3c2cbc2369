//! Request validation for the weather and account endpoints.

use regex::Regex;
use std::sync::LazyLock;
use weather_core::TemperatureUnit;

use crate::error::ApiError;

pub const MIN_TIME_PERIOD: u32 = 2;
pub const MAX_TIME_PERIOD: u32 = 5;
pub const MIN_PASSWORD_LEN: usize = 6;

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("zip pattern is valid"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

pub fn zip_code(zip: &str) -> Result<&str, ApiError> {
    let zip = zip.trim();
    if ZIP_RE.is_match(zip) {
        Ok(zip)
    } else {
        Err(ApiError::Validation(format!(
            "'{zip}' is not a valid US zip code (expected 12345 or 12345-6789)"
        )))
    }
}

pub fn units(units: Option<&str>) -> Result<TemperatureUnit, ApiError> {
    let units = units.ok_or_else(|| {
        ApiError::Validation("The units parameter is required (C or F)".into())
    })?;

    // Only the single-letter codes are accepted on the API.
    match units {
        "C" | "c" | "F" | "f" => units
            .parse()
            .map_err(|err: weather_core::UnitError| ApiError::Validation(err.to_string())),
        other => Err(ApiError::Validation(format!(
            "Unsupported units '{other}'. Use C or F."
        ))),
    }
}

pub fn time_period(period: Option<&str>) -> Result<u32, ApiError> {
    let raw = period
        .ok_or_else(|| ApiError::Validation("The timePeriod parameter is required".into()))?;

    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|days| (MIN_TIME_PERIOD..=MAX_TIME_PERIOD).contains(days))
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "timePeriod must be a whole number of days between \
                 {MIN_TIME_PERIOD} and {MAX_TIME_PERIOD}, got '{raw}'"
            ))
        })
}

pub fn credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::Validation(format!("'{email}' is not a valid email address")));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
