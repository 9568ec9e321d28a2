//! Batch orchestration: one report per station, failures kept per station.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{Instrument, error, info, warn};

use crate::climate::assemble::{ReportDataset, assemble, product_id};
use crate::climate::daily::DailyAccumulator;
use crate::climate::types::{DailyObservation, HistoricalNorm, Station};
use crate::config::LetterCase;
use crate::error::BuildError;
use crate::render::Renderer;
use crate::store::ClimateStore;

/// What to build: the report month runs from the first of the target's
/// month up to and including the target date.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub target: NaiveDate,
    /// Date used to decide whether the month has closed.
    pub today: NaiveDate,
    pub remarks: String,
    pub letter_case: LetterCase,
}

/// Result of one station's pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationOutcome {
    pub station: String,
    pub product_id: String,
    pub success: bool,
    pub message: String,
}

/// Result of a batch: rendered reports keyed by product id, an overall
/// success flag and one message line per station.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub reports: BTreeMap<String, String>,
    pub success: bool,
    pub message: String,
    pub stations: Vec<StationOutcome>,
}

async fn fetch_observation(
    store: &dyn ClimateStore,
    date: NaiveDate,
    station_id: &str,
) -> DailyObservation {
    let mut obs = match store.daily(date, station_id).await {
        Ok(Some(obs)) => obs,
        Ok(None) => {
            warn!(%date, "No daily observation, using missing placeholder");
            return DailyObservation::missing();
        }
        Err(e) => {
            warn!(%date, error = %e, "Daily observation lookup failed, using missing placeholder");
            return DailyObservation::missing();
        }
    };

    if let Err(e) = store.build_derived(date, station_id, &mut obs).await {
        warn!(%date, error = %e, "Could not build cumulative degree days");
    }
    obs
}

async fn fetch_norm(store: &dyn ClimateStore, date: NaiveDate, station_id: &str) -> HistoricalNorm {
    match store.daily_norm(date, station_id).await {
        Ok(norm) => norm,
        Err(e) => {
            warn!(%date, error = %e, "Normals unavailable, using missing normal");
            HistoricalNorm::missing()
        }
    }
}

/// Walks the month for one station and assembles its dataset.
///
/// Per-day lookup failures are logged and replaced with missing values; a
/// failed period lookup fails the station.
pub async fn build_station_dataset(
    store: &dyn ClimateStore,
    station: &Station,
    request: &BuildRequest,
) -> Result<ReportDataset, BuildError> {
    let target = request.target;
    let start = target.with_day(1).ok_or_else(|| {
        BuildError::AssemblyInconsistency(format!("no first day for {target}"))
    })?;

    let mut accumulator = DailyAccumulator::new();
    for day in 1..=target.day() {
        let date = target.with_day(day).ok_or_else(|| {
            BuildError::AssemblyInconsistency(format!("no day {day} in month of {target}"))
        })?;
        let obs = fetch_observation(store, date, &station.id).await;
        let norm = fetch_norm(store, date, &station.id).await;
        accumulator.add_day(day, &obs, &norm);
    }

    let period = store.period(start, target, &station.id).await?;

    assemble(
        station,
        target,
        request.today,
        &request.remarks,
        accumulator,
        &period,
        request.letter_case,
    )
}

async fn build_station_report(
    store: &dyn ClimateStore,
    renderer: &dyn Renderer,
    station: &Station,
    request: &BuildRequest,
) -> Result<String, BuildError> {
    let dataset = build_station_dataset(store, station, request).await?;
    Ok(renderer.render(&dataset, request.letter_case)?)
}

/// Builds reports for the given stations, one after the other.
///
/// A failing station is recorded in the outcome and never stops the batch.
#[tracing::instrument(skip_all, fields(date = %request.target, stations = stations.len()))]
pub async fn build_for_stations(
    store: &dyn ClimateStore,
    renderer: &dyn Renderer,
    stations: &[Station],
    request: &BuildRequest,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        success: true,
        ..Default::default()
    };
    let mut lines = Vec::new();

    for station in stations {
        let id = product_id(station, request.target);
        let span = tracing::info_span!(
            "build_station",
            station = %station.id,
            name = %station.name,
            product_id = %id,
        );

        let result = build_station_report(store, renderer, station, request)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        let station_outcome = match result {
            Ok(text) => {
                info!("Report created");
                outcome.reports.insert(id.clone(), text);
                StationOutcome {
                    station: station.name.clone(),
                    product_id: id,
                    success: true,
                    message: format!("Successfully created report for Station {}.", station.name),
                }
            }
            Err(e) => {
                error!(error = %e, "Report creation failed");
                outcome.success = false;
                StationOutcome {
                    station: station.name.clone(),
                    product_id: id,
                    success: false,
                    message: format!(
                        "Something went wrong during creation of F6 report for station {}. {}",
                        station.name, e
                    ),
                }
            }
        };
        lines.push(station_outcome.message.clone());
        outcome.stations.push(station_outcome);
    }

    outcome.message = lines.join("\n");
    info!(
        created = outcome.reports.len(),
        failed = stations.len() - outcome.reports.len(),
        "Batch finished"
    );
    outcome
}

/// Builds reports for every station the store knows.
///
/// Only a failed station listing aborts the batch.
#[tracing::instrument(skip_all, fields(date = %request.target))]
pub async fn build_all(
    store: &dyn ClimateStore,
    renderer: &dyn Renderer,
    request: &BuildRequest,
) -> Result<BatchOutcome, BuildError> {
    let stations = store
        .stations()
        .await
        .map_err(BuildError::DataStoreUnavailable)?;
    info!(count = stations.len(), "Stations listed");
    Ok(build_for_stations(store, renderer, &stations, request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::sentinel::Amount;
    use crate::climate::types::{DegreeDayEpochs, PeriodData};
    use crate::render::TemplateError;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct MemoryStore {
        stations: Vec<Station>,
        days: HashMap<(String, NaiveDate), DailyObservation>,
        failing_days: HashSet<NaiveDate>,
        norms_fail: bool,
        periods: HashMap<String, PeriodData>,
        stations_fail: bool,
    }

    #[async_trait]
    impl ClimateStore for MemoryStore {
        async fn stations(&self) -> Result<Vec<Station>, StoreError> {
            if self.stations_fail {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            Ok(self.stations.clone())
        }

        async fn daily(
            &self,
            date: NaiveDate,
            station_id: &str,
        ) -> Result<Option<DailyObservation>, StoreError> {
            if self.failing_days.contains(&date) {
                return Err(StoreError::Unavailable("timeout".into()));
            }
            Ok(self.days.get(&(station_id.to_string(), date)).cloned())
        }

        async fn daily_norm(
            &self,
            _date: NaiveDate,
            _station_id: &str,
        ) -> Result<HistoricalNorm, StoreError> {
            if self.norms_fail {
                return Err(StoreError::NormalsUnavailable("no normals".into()));
            }
            Ok(HistoricalNorm {
                mean_temp: Some(55.0),
                ..Default::default()
            })
        }

        async fn period(
            &self,
            start: NaiveDate,
            end: NaiveDate,
            station_id: &str,
        ) -> Result<PeriodData, StoreError> {
            self.periods
                .get(station_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    what: format!("period {start}..{end} at station {station_id}"),
                })
        }

        async fn build_derived(
            &self,
            date: NaiveDate,
            _station_id: &str,
            obs: &mut DailyObservation,
        ) -> Result<(), StoreError> {
            obs.heating_to_date = DegreeDayEpochs {
                month_to_date: Some(10 * date.day() as i32),
                ..Default::default()
            };
            Ok(())
        }
    }

    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, dataset: &ReportDataset, _case: LetterCase) -> Result<String, TemplateError> {
            match dataset.get("station_name") {
                Some("BROKEN") => Err(TemplateError::Invocation("unknown key 'x'".into())),
                Some(name) => Ok(format!("{name} {}", dataset.days.len())),
                None => Err(TemplateError::Invocation("unknown key 'station_name'".into())),
            }
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn station(id: &str, name: &str) -> Station {
        Station {
            id: id.to_string(),
            icao: format!("K{id}"),
            name: name.to_string(),
            latitude: 41.3,
            longitude: 96.4,
        }
    }

    fn request() -> BuildRequest {
        BuildRequest {
            target: date(3),
            today: date(4),
            remarks: String::new(),
            letter_case: LetterCase::Upper,
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore {
            stations: vec![station("OAX", "OMAHA"), station("DSM", "DES MOINES")],
            ..Default::default()
        };
        for id in ["OAX", "DSM"] {
            for (day, max, min) in [(1, 70, 50), (3, 75, 55)] {
                store.days.insert(
                    (id.to_string(), date(day)),
                    DailyObservation {
                        date: Some(date(day)),
                        max_temp: Some(max),
                        min_temp: Some(min),
                        precip: Amount::Trace,
                        ..Default::default()
                    },
                );
            }
            store.periods.insert(id.to_string(), PeriodData::default());
        }
        store
    }

    #[tokio::test]
    async fn test_missing_day_becomes_placeholder() {
        let store = store();
        let dataset = build_station_dataset(&store, &store.stations[0], &request())
            .await
            .unwrap();

        assert_eq!(dataset.days.len(), 3);
        assert_eq!(dataset.days[1].max, "   M");
        assert_eq!(dataset.days[0].avg, "  60");
        assert_eq!(dataset.days[0].dep, "   5");
        assert_eq!(dataset.get("sum_max"), Some("  145"));
        assert_eq!(dataset.get("sum_wtr"), Some("     T"));
        // cumulative fields come from the derived builder on the last day
        assert_eq!(dataset.get("heating_month"), Some("    30"));
    }

    #[tokio::test]
    async fn test_lookup_failures_are_not_fatal() {
        let mut store = store();
        store.failing_days.insert(date(1));
        store.norms_fail = true;

        let dataset = build_station_dataset(&store, &store.stations[0], &request())
            .await
            .unwrap();
        assert_eq!(dataset.days[0].max, "   M");
        assert_eq!(dataset.days[2].avg, "  65");
        assert_eq!(dataset.days[2].dep, "   M");
        assert_eq!(dataset.get("sum_max"), Some("   75"));
    }

    #[tokio::test]
    async fn test_batch_keeps_going_after_station_failure() {
        let mut store = store();
        store.periods.remove("OAX");

        let outcome = build_for_stations(&store, &EchoRenderer, &store.stations, &request()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports.get("DSMLCDMAR").map(String::as_str), Some("DES MOINES 3"));
        assert!(!outcome.reports.contains_key("OAXLCDMAR"));

        let lines: Vec<&str> = outcome.message.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(
            "Something went wrong during creation of F6 report for station OMAHA. "
        ));
        assert_eq!(lines[1], "Successfully created report for Station DES MOINES.");
        assert!(!outcome.stations[0].success);
        assert!(outcome.stations[1].success);
    }

    #[tokio::test]
    async fn test_render_failure_marks_station_failed() {
        let mut store = store();
        store.stations = vec![station("OAX", "BROKEN")];

        let outcome = build_for_stations(&store, &EchoRenderer, &store.stations, &request()).await;
        assert!(!outcome.success);
        assert!(outcome.reports.is_empty());
        assert!(outcome.message.ends_with("template invocation failed: unknown key 'x'"));
    }

    #[tokio::test]
    async fn test_build_all() {
        let store = store();
        let outcome = build_all(&store, &EchoRenderer, &request()).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(
            outcome.message,
            "Successfully created report for Station OMAHA.\n\
             Successfully created report for Station DES MOINES."
        );
    }

    #[tokio::test]
    async fn test_station_listing_failure_is_fatal() {
        let store = MemoryStore {
            stations_fail: true,
            ..Default::default()
        };
        let result = build_all(&store, &EchoRenderer, &request()).await;
        assert!(matches!(result, Err(BuildError::DataStoreUnavailable(_))));
    }
}
