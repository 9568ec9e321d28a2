//! Output persistence for generated reports.
//!
//! Writes report text files, prints datasets as JSON, and appends batch
//! results to a CSV log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::climate::assemble::ReportDataset;
use crate::report::StationOutcome;

/// One row of the batch log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub timestamp: DateTime<Utc>,
    pub station: String,
    pub product_id: String,
    pub success: bool,
    pub message: String,
}

impl BatchRecord {
    pub fn from_outcome(outcome: &StationOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            station: outcome.station.clone(),
            product_id: outcome.product_id.clone(),
            success: outcome.success,
            message: outcome.message.clone(),
        }
    }
}

/// Writes a report to `<dir>/<product_id>.txt`, creating `dir` if needed.
pub fn write_report(dir: &str, product_id: &str, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create '{dir}'"))?;
    let path = Path::new(dir).join(format!("{product_id}.txt"));
    std::fs::write(&path, text).with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(path)
}

/// Writes every report in `reports`, keyed by product id.
///
/// A report that cannot be written is logged and skipped. Returns how many
/// were written.
pub fn write_reports(dir: &str, reports: &BTreeMap<String, String>) -> usize {
    let mut written = 0;
    for (product_id, text) in reports {
        match write_report(dir, product_id, text) {
            Ok(_) => written += 1,
            Err(e) => error!(error = %e, product_id = %product_id, "Failed to write report"),
        }
    }
    written
}

/// Prints an assembled dataset to stdout as pretty JSON.
pub fn print_json(dataset: &ReportDataset) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(dataset)?);
    Ok(())
}

/// Appends a [`BatchRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_batch_record(path: &str, record: &BatchRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending batch record");

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on a fresh file
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
