use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

/// A ZIP code resolved to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub country: Option<String>,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
            country: None,
        }
    }
}

/// Mean temperature components of a single forecast day, in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureComponents {
    pub morning: f64,
    pub day: f64,
    pub evening: f64,
    pub night: f64,
}

impl TemperatureComponents {
    pub fn mean_kelvin(&self) -> f64 {
        (self.morning + self.day + self.evening + self.night) / 4.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecastPoint {
    /// UTC calendar date of the forecast.
    pub date: NaiveDate,
    pub temperature: TemperatureComponents,
    /// Precipitation volume, mm. Absent when the upstream reports none.
    pub rain: Option<f64>,
}

impl DailyForecastPoint {
    pub fn has_rain(&self) -> bool {
        self.rain.is_some_and(|mm| mm > 0.0)
    }
}

/// Upstream weather payload for one coordinate, as interpreted by the provider.
/// The daily points keep the upstream order; consumers sort before windowing.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Coordinate echoed back by the weather endpoint, if it sent one.
    pub echo: Option<(f64, f64)>,
    pub current_temperature_kelvin: f64,
    pub current_report_date: NaiveDate,
    pub daily: Vec<DailyForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: f64,
    pub unit: TemperatureUnit,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub rain_possible_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageWeather {
    pub average_temperature: f64,
    pub unit: TemperatureUnit,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub rain_possible_in_period: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_weather_uses_camel_case_on_the_wire() {
        let value = serde_json::to_value(CurrentWeather {
            temperature: 21.5,
            unit: TemperatureUnit::Celsius,
            latitude: 40.75,
            longitude: -73.99,
            rain_possible_today: true,
        })
        .unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "temperature": 21.5,
                "unit": "C",
                "lat": 40.75,
                "lon": -73.99,
                "rainPossibleToday": true
            })
        );
    }

    #[test]
    fn rain_requires_a_positive_amount() {
        let point = |rain| DailyForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            temperature: TemperatureComponents {
                morning: 290.0,
                day: 290.0,
                evening: 290.0,
                night: 290.0,
            },
            rain,
        };

        assert!(point(Some(0.4)).has_rain());
        assert!(!point(Some(0.0)).has_rain());
        assert!(!point(None).has_rain());
    }
}
