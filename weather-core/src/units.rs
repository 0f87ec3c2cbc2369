use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::UnitError;

const KELVIN_OFFSET: f64 = 273.15;

/// Temperature unit a caller can ask for. Upstream values are always Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Short code used on the wire and in query strings.
    pub fn code(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }

    pub fn convert(&self, kelvin: f64) -> f64 {
        convert_kelvin(kelvin, *self)
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TemperatureUnit {
    type Err = UnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(UnitError::UnsupportedUnit(value.to_string())),
        }
    }
}

/// Convert an absolute temperature to the requested unit.
pub fn convert_kelvin(kelvin: f64, unit: TemperatureUnit) -> f64 {
    let celsius = kelvin - KELVIN_OFFSET;
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
    }
}

/// Convert using a raw unit code. Any code other than Celsius/Fahrenheit is a
/// contract violation: callers are expected to validate units before this point.
pub fn convert_kelvin_to_unit(kelvin: f64, unit: &str) -> Result<f64, UnitError> {
    let unit: TemperatureUnit = unit.parse()?;
    Ok(convert_kelvin(kelvin, unit))
}
