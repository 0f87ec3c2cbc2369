//! Derived fields computed from a [`WeatherSnapshot`].

use crate::model::{DailyForecastPoint, WeatherSnapshot};

/// True iff the forecast day matching the current report's UTC date reports rain.
pub fn rain_possible_today(snapshot: &WeatherSnapshot) -> bool {
    snapshot
        .daily
        .iter()
        .find(|point| point.date == snapshot.current_report_date)
        .is_some_and(DailyForecastPoint::has_rain)
}

/// Aggregate over the earliest `period_days` forecast days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodSummary {
    /// Mean of the per-day means, still in Kelvin.
    pub mean_kelvin: f64,
    pub rain_possible: bool,
    /// Days actually used; fewer than requested when the upstream sent fewer.
    pub days: usize,
}

/// Sorts the points by date and summarizes the first `min(period_days, len)`.
/// Returns `None` when there is nothing to average.
pub fn summarize_period(daily: &[DailyForecastPoint], period_days: usize) -> Option<PeriodSummary> {
    let mut sorted: Vec<&DailyForecastPoint> = daily.iter().collect();
    sorted.sort_by_key(|point| point.date);

    let window = &sorted[..period_days.min(sorted.len())];
    if window.is_empty() {
        return None;
    }

    let total: f64 = window.iter().map(|point| point.temperature.mean_kelvin()).sum();

    Some(PeriodSummary {
        mean_kelvin: total / window.len() as f64,
        rain_possible: window.iter().any(|point| point.has_rain()),
        days: window.len(),
    })
}
