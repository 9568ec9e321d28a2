//! Data store collaborators.
//!
//! [`ClimateStore`] is the async trait the report pipeline reads through.
//! [`DirectoryStore`] implements it over CSV and JSON files on disk.

mod directory;

pub use directory::DirectoryStore;

use chrono::NaiveDate;
use thiserror::Error;

use crate::climate::types::{DailyObservation, HistoricalNorm, PeriodData, Station};

/// Failures reported by a data store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),
    #[error("no data for {what}")]
    NotFound { what: String },
    #[error("normals unavailable: {0}")]
    NormalsUnavailable(String),
    #[error("malformed data in {source_name}: {message}")]
    Malformed {
        source_name: String,
        message: String,
    },
}

/// Source of stations, daily observations, normals and period aggregates.
#[async_trait::async_trait]
pub trait ClimateStore: Send + Sync {
    /// Returns every station reports are built for.
    async fn stations(&self) -> Result<Vec<Station>, StoreError>;

    /// Returns the day's observation, or `None` when the store has no row.
    async fn daily(
        &self,
        date: NaiveDate,
        station_id: &str,
    ) -> Result<Option<DailyObservation>, StoreError>;

    /// Returns the day's climatological normal.
    async fn daily_norm(&self, date: NaiveDate, station_id: &str)
    -> Result<HistoricalNorm, StoreError>;

    /// Returns the aggregate, normals and wind extremes for `start..=end`.
    async fn period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        station_id: &str,
    ) -> Result<PeriodData, StoreError>;

    /// Fills the cumulative degree-day fields of `obs` as of `date`.
    ///
    /// Idempotent: running it twice leaves the observation unchanged.
    async fn build_derived(
        &self,
        date: NaiveDate,
        station_id: &str,
        obs: &mut DailyObservation,
    ) -> Result<(), StoreError>;
}
