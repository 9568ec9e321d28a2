//! Data types shared by the monthly summary pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::climate::sentinel::Amount;

/// Number of weather-phenomenon flags carried per day.
pub const WEATHER_FLAG_COUNT: usize = 18;

/// A climate station as listed by the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub icao: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Speed and direction of a single wind observation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
    pub direction: Option<i32>,
}

/// Fixed-size weather-phenomenon flag vector for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeatherFlags(pub [bool; WEATHER_FLAG_COUNT]);

impl WeatherFlags {
    pub fn is_set(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }
}

impl std::str::FromStr for WeatherFlags {
    type Err = String;

    /// Parses a string of `0`/`1` characters, one per flag position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != WEATHER_FLAG_COUNT {
            return Err(format!(
                "expected {WEATHER_FLAG_COUNT} weather flags, got {}",
                s.len()
            ));
        }
        let mut flags = [false; WEATHER_FLAG_COUNT];
        for (slot, c) in flags.iter_mut().zip(s.chars()) {
            *slot = match c {
                '0' => false,
                '1' => true,
                other => return Err(format!("invalid weather flag '{other}'")),
            };
        }
        Ok(Self(flags))
    }
}

/// Cumulative degree-day counts as of a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DegreeDayEpochs {
    pub month_to_date: Option<i32>,
    pub since_july_1: Option<i32>,
    pub since_january_1: Option<i32>,
}

/// One calendar day's raw measurements for a station.
///
/// Never mutated after the derived-field builder has run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyObservation {
    pub date: Option<NaiveDate>,
    pub max_temp: Option<i32>,
    pub min_temp: Option<i32>,
    pub precip: Amount,
    pub snowfall: Amount,
    pub snow_depth: Amount,
    pub avg_wind_speed: Option<f64>,
    pub max_wind: Wind,
    pub max_gust: Wind,
    pub minutes_sun: Option<i32>,
    pub percent_possible_sun: Option<i32>,
    /// Fraction of sky covered, 0.0 to 1.0.
    pub sky_cover: Option<f64>,
    pub weather: Option<WeatherFlags>,
    pub heating_days: Option<i32>,
    pub cooling_days: Option<i32>,
    pub heating_to_date: DegreeDayEpochs,
    pub cooling_to_date: DegreeDayEpochs,
}

impl DailyObservation {
    /// The all-missing placeholder used when a day cannot be fetched.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Climatological normal for one day.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalNorm {
    pub mean_temp: Option<f64>,
    pub max_temp_mean: Option<f64>,
    pub min_temp_mean: Option<f64>,
}

impl HistoricalNorm {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Start and end day-of-month of a 24-hour maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaySpan {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

/// Days exceeding the externally mandated thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdCounts {
    pub max_below_32: Option<u32>,
    pub max_above_90: Option<u32>,
    pub min_below_32: Option<u32>,
    pub min_below_0: Option<u32>,
    pub precip_above_01: Option<u32>,
    pub precip_above_10: Option<u32>,
    pub precip_above_50: Option<u32>,
    pub precip_above_100: Option<u32>,
}

/// Counts of days by average sky cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyDayCounts {
    pub fair: Option<u32>,
    pub partly_cloudy: Option<u32>,
    pub mostly_cloudy: Option<u32>,
}

/// Highest and lowest sea-level pressure of the month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureExtremes {
    pub max: Option<f64>,
    pub max_day: Option<u32>,
    pub min: Option<f64>,
    pub min_day: Option<u32>,
}

/// Pre-aggregated month-to-date statistics from the data store.
///
/// Tie lists are chronological; a `None` day is the missing-date sentinel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSummary {
    pub mean_temp: Option<f64>,
    pub max_temp: Option<i32>,
    pub max_temp_days: Vec<Option<u32>>,
    pub min_temp: Option<i32>,
    pub min_temp_days: Vec<Option<u32>>,
    pub precip_total: Amount,
    pub precip_max_24h: Amount,
    pub precip_24h_dates: Vec<DaySpan>,
    pub snow_total: Amount,
    pub snow_max_24h: Amount,
    pub snow_24h_dates: Vec<DaySpan>,
    pub snow_depth_max: Amount,
    pub snow_depth_max_days: Vec<Option<u32>>,
    pub thresholds: ThresholdCounts,
    pub sky_days: SkyDayCounts,
    pub heating: DegreeDayEpochs,
    pub cooling: DegreeDayEpochs,
    pub pressure: PressureExtremes,
}

/// Climatological counterpart of [`PeriodSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodNorm {
    pub mean_temp: Option<f64>,
    pub precip_total: Amount,
    pub heating: DegreeDayEpochs,
    pub cooling: DegreeDayEpochs,
}

/// Highest sustained wind and gust of the month, all entries tied at the max.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremeWindRecord {
    pub max_sustained: Vec<Wind>,
    pub max_gust: Vec<Wind>,
}

/// Everything the period-aggregate lookup returns for one station and window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodData {
    pub summary: PeriodSummary,
    pub norm: PeriodNorm,
    pub wind: ExtremeWindRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_flags_parse() {
        let flags: WeatherFlags = "100000000000100001".parse().unwrap();
        assert!(flags.is_set(0));
        assert!(flags.is_set(12));
        assert!(flags.is_set(17));
        assert!(!flags.is_set(1));
        assert!(!flags.is_set(99));
    }

    #[test]
    fn test_weather_flags_reject_bad_input() {
        assert!("101".parse::<WeatherFlags>().is_err());
        assert!("10000000000010000x".parse::<WeatherFlags>().is_err());
    }

    #[test]
    fn test_period_data_defaults_missing_sections() {
        let data: PeriodData =
            serde_json::from_str(r#"{"summary": {"precip_total": "T", "max_temp": 91}}"#).unwrap();
        assert_eq!(data.summary.precip_total, Amount::Trace);
        assert_eq!(data.summary.max_temp, Some(91));
        assert!(data.summary.max_temp_days.is_empty());
        assert_eq!(data.norm.precip_total, Amount::Missing);
        assert!(data.wind.max_gust.is_empty());
    }
}
