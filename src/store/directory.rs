use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, de};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{ClimateStore, StoreError};
use crate::climate::sentinel::Amount;
use crate::climate::types::{
    DailyObservation, DegreeDayEpochs, HistoricalNorm, PeriodData, Station, WeatherFlags, Wind,
};

/// Parses an optional numeric column where empty and `M` mean missing.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("M") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// One row of a station's `daily.csv`.
#[derive(Debug, Clone, Deserialize)]
struct DailyRecord {
    date: NaiveDate,
    #[serde(default, deserialize_with = "lenient")]
    max_temp: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    min_temp: Option<i32>,
    #[serde(default)]
    precip: Amount,
    #[serde(default)]
    snowfall: Amount,
    #[serde(default)]
    snow_depth: Amount,
    #[serde(default, deserialize_with = "lenient")]
    avg_wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    max_wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    max_wind_dir: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    max_gust_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    max_gust_dir: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    minutes_sun: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    percent_possible_sun: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    sky_cover: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    weather: Option<WeatherFlags>,
    #[serde(default, deserialize_with = "lenient")]
    heating_days: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    cooling_days: Option<i32>,
}

impl From<&DailyRecord> for DailyObservation {
    fn from(r: &DailyRecord) -> Self {
        DailyObservation {
            date: Some(r.date),
            max_temp: r.max_temp,
            min_temp: r.min_temp,
            precip: r.precip,
            snowfall: r.snowfall,
            snow_depth: r.snow_depth,
            avg_wind_speed: r.avg_wind_speed,
            max_wind: Wind {
                speed: r.max_wind_speed,
                direction: r.max_wind_dir,
            },
            max_gust: Wind {
                speed: r.max_gust_speed,
                direction: r.max_gust_dir,
            },
            minutes_sun: r.minutes_sun,
            percent_possible_sun: r.percent_possible_sun,
            sky_cover: r.sky_cover,
            weather: r.weather,
            heating_days: r.heating_days,
            cooling_days: r.cooling_days,
            heating_to_date: DegreeDayEpochs::default(),
            cooling_to_date: DegreeDayEpochs::default(),
        }
    }
}

/// One row of a station's `norms.csv`.
#[derive(Debug, Clone, Deserialize)]
struct NormRecord {
    month: u32,
    day: u32,
    #[serde(default, deserialize_with = "lenient")]
    mean_temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    max_temp_mean: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    min_temp_mean: Option<f64>,
}

/// A [`ClimateStore`] backed by a directory of files:
///
/// ```text
/// <root>/stations.json
/// <root>/<station id>/daily.csv
/// <root>/<station id>/norms.csv
/// <root>/<station id>/period/<YYYY-MM>.json
/// ```
///
/// Period files hold the month-to-date aggregate for the month of the
/// requested end date.
pub struct DirectoryStore {
    root: PathBuf,
    daily_cache: Mutex<HashMap<String, Arc<Vec<DailyRecord>>>>,
    norm_cache: Mutex<HashMap<String, Arc<Vec<NormRecord>>>>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            daily_cache: Mutex::new(HashMap::new()),
            norm_cache: Mutex::new(HashMap::new()),
        }
    }

    fn station_dir(&self, station_id: &str) -> PathBuf {
        self.root.join(station_id)
    }

    fn daily_records(&self, station_id: &str) -> Result<Arc<Vec<DailyRecord>>, StoreError> {
        if let Ok(cache) = self.daily_cache.lock() {
            if let Some(records) = cache.get(station_id) {
                return Ok(records.clone());
            }
        }

        let path = self.station_dir(station_id).join("daily.csv");
        let records: Arc<Vec<DailyRecord>> = Arc::new(read_csv(&path).map_err(|e| match e {
            CsvLoadError::Open(msg) => StoreError::Unavailable(msg),
            CsvLoadError::Row(message) => StoreError::Malformed {
                source_name: path.display().to_string(),
                message,
            },
        })?);
        debug!(station = station_id, rows = records.len(), "Loaded daily records");

        if let Ok(mut cache) = self.daily_cache.lock() {
            cache.insert(station_id.to_string(), records.clone());
        }
        Ok(records)
    }

    fn norm_records(&self, station_id: &str) -> Result<Arc<Vec<NormRecord>>, StoreError> {
        if let Ok(cache) = self.norm_cache.lock() {
            if let Some(norms) = cache.get(station_id) {
                return Ok(norms.clone());
            }
        }

        let path = self.station_dir(station_id).join("norms.csv");
        let norms: Arc<Vec<NormRecord>> = Arc::new(read_csv(&path).map_err(|e| match e {
            CsvLoadError::Open(msg) | CsvLoadError::Row(msg) => StoreError::NormalsUnavailable(msg),
        })?);
        debug!(station = station_id, rows = norms.len(), "Loaded daily normals");

        if let Ok(mut cache) = self.norm_cache.lock() {
            cache.insert(station_id.to_string(), norms.clone());
        }
        Ok(norms)
    }
}

enum CsvLoadError {
    Open(String),
    Row(String),
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, CsvLoadError> {
    let file = File::open(path)
        .map_err(|e| CsvLoadError::Open(format!("{}: {}", path.display(), e)))?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.map_err(|e| CsvLoadError::Row(e.to_string()))?;
        rows.push(record);
    }
    Ok(rows)
}

/// Sum of the non-missing values, or `None` when every value is missing.
fn sum_present(values: impl Iterator<Item = Option<i32>>) -> Option<i32> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0) + v))
}

fn season_start(date: NaiveDate) -> Option<NaiveDate> {
    let year = if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    };
    NaiveDate::from_ymd_opt(year, 7, 1)
}

fn epochs(
    records: &[DailyRecord],
    date: NaiveDate,
    value: fn(&DailyRecord) -> Option<i32>,
) -> DegreeDayEpochs {
    let total_since = |start: Option<NaiveDate>| {
        let start = start?;
        sum_present(
            records
                .iter()
                .filter(|r| r.date >= start && r.date <= date)
                .map(value),
        )
    };

    DegreeDayEpochs {
        month_to_date: total_since(date.with_day(1)),
        since_july_1: total_since(season_start(date)),
        since_january_1: total_since(NaiveDate::from_ymd_opt(date.year(), 1, 1)),
    }
}

#[async_trait]
impl ClimateStore for DirectoryStore {
    async fn stations(&self) -> Result<Vec<Station>, StoreError> {
        let path = self.root.join("stations.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn daily(
        &self,
        date: NaiveDate,
        station_id: &str,
    ) -> Result<Option<DailyObservation>, StoreError> {
        let records = self.daily_records(station_id)?;
        Ok(records
            .iter()
            .find(|r| r.date == date)
            .map(DailyObservation::from))
    }

    async fn daily_norm(
        &self,
        date: NaiveDate,
        station_id: &str,
    ) -> Result<HistoricalNorm, StoreError> {
        let norms = self.norm_records(station_id)?;
        norms
            .iter()
            .find(|n| n.month == date.month() && n.day == date.day())
            .map(|n| HistoricalNorm {
                mean_temp: n.mean_temp,
                max_temp_mean: n.max_temp_mean,
                min_temp_mean: n.min_temp_mean,
            })
            .ok_or_else(|| {
                StoreError::NormalsUnavailable(format!(
                    "no normal for {} at station {}",
                    date.format("%m-%d"),
                    station_id
                ))
            })
    }

    async fn period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        station_id: &str,
    ) -> Result<PeriodData, StoreError> {
        let path = self
            .station_dir(station_id)
            .join("period")
            .join(format!("{}.json", end.format("%Y-%m")));
        debug!(station = station_id, %start, %end, path = %path.display(), "Loading period aggregate");

        let content = std::fs::read_to_string(&path).map_err(|_| StoreError::NotFound {
            what: format!("period {start}..{end} at station {station_id}"),
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn build_derived(
        &self,
        date: NaiveDate,
        station_id: &str,
        obs: &mut DailyObservation,
    ) -> Result<(), StoreError> {
        let records = self.daily_records(station_id)?;
        obs.heating_to_date = epochs(&records, date, |r| r.heating_days);
        obs.cooling_to_date = epochs(&records, date, |r| r.cooling_days);
        Ok(())
    }
}
