use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use weather_core::{AverageWeather, CurrentWeather};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// A result that can be printed for humans as well as serialized.
pub trait Render: Serialize {
    fn text(&self) -> String;
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl Render for CurrentWeather {
    fn text(&self) -> String {
        format!(
            "Current temperature at {:.4}, {:.4}: {:.1}{}\nRain possible today: {}",
            self.latitude,
            self.longitude,
            self.temperature,
            self.unit.symbol(),
            yes_no(self.rain_possible_today),
        )
    }
}

impl Render for AverageWeather {
    fn text(&self) -> String {
        format!(
            "Average temperature at {:.4}, {:.4}: {:.1}{}\nRain possible in period: {}",
            self.latitude,
            self.longitude,
            self.average_temperature,
            self.unit.symbol(),
            yes_no(self.rain_possible_in_period),
        )
    }
}

pub fn render<T: Render>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(value.text()),
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(|yaml| yaml.trim_end().to_string())
            .context("Failed to render YAML"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::TemperatureUnit;

    fn current() -> CurrentWeather {
        CurrentWeather {
            temperature: 21.345,
            unit: TemperatureUnit::Celsius,
            latitude: 40.7484,
            longitude: -73.9967,
            rain_possible_today: true,
        }
    }

    #[test]
    fn text_output() {
        assert_eq!(
            render(&current(), OutputFormat::Text).unwrap(),
            "Current temperature at 40.7484, -73.9967: 21.3°C\nRain possible today: yes"
        );

        let average = AverageWeather {
            average_temperature: 66.2,
            unit: TemperatureUnit::Fahrenheit,
            latitude: 40.7484,
            longitude: -73.9967,
            rain_possible_in_period: false,
        };
        assert!(
            render(&average, OutputFormat::Text)
                .unwrap()
                .contains("66.2°F\nRain possible in period: no")
        );
    }

    #[test]
    fn json_output_matches_service_shape() {
        let json = render(&current(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["unit"], "C");
        assert_eq!(value["rainPossibleToday"], true);
    }

    #[test]
    fn yaml_output() {
        let yaml = render(&current(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("unit: C"));
        assert!(yaml.contains("rainPossibleToday: true"));
    }
}
