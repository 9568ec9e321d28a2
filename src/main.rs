//! CLI entry point for the F6 monthly climate report builder.
//!
//! Provides subcommands for building reports for every station, printing the
//! assembled dataset of one station, and listing the stations in the store.

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use f6_builder::{
    config::{LetterCase, ReportConfig},
    output::{BatchRecord, append_batch_record, print_json, write_reports},
    render::TemplateRenderer,
    report::{BuildRequest, build_all, build_for_stations, build_station_dataset},
    store::{ClimateStore, DirectoryStore},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "f6_builder")]
#[command(about = "Builds monthly F6 climate summary reports", long_about = None)]
struct Cli {
    /// Directory holding stations.json and per-station data
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build reports for a date (month-to-date) and write them to disk
    Build {
        /// Target date, YYYY-MM-DD (default: yesterday)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Only build for these station ids (repeatable)
        #[arg(short, long = "station")]
        stations: Vec<String>,

        /// Remarks appended to every report
        #[arg(short, long, default_value = "")]
        remarks: String,

        /// Use the mixed-case template
        #[arg(long, default_value_t = false)]
        mixed_case: bool,

        /// Directory containing the report templates
        #[arg(long)]
        template_dir: Option<String>,

        /// Directory to write reports to
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Print the assembled dataset for one station as JSON
    Dataset {
        /// Station id
        station: String,

        /// Target date, YYYY-MM-DD (default: yesterday)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Use mixed-case header values
        #[arg(long, default_value_t = false)]
        mixed_case: bool,
    },
    /// List stations known to the data store
    ListStations,
}

fn yesterday() -> Result<NaiveDate> {
    Local::now()
        .date_naive()
        .pred_opt()
        .context("no date before today")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/f6_builder.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("f6_builder.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = ReportConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let store = DirectoryStore::new(&config.data_dir);

    match cli.command {
        Commands::Build {
            date,
            stations,
            remarks,
            mixed_case,
            template_dir,
            output_dir,
        } => {
            if mixed_case {
                config.all_upper_case = false;
            }
            if let Some(dir) = template_dir {
                config.template_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let request = BuildRequest {
                target: date.map_or_else(yesterday, Ok)?,
                today: Local::now().date_naive(),
                remarks,
                letter_case: config.letter_case(),
            };
            build(&store, &config, &stations, &request).await?;
        }
        Commands::Dataset {
            station,
            date,
            mixed_case,
        } => {
            let stations = store.stations().await?;
            let Some(station) = stations.into_iter().find(|s| s.id == station) else {
                bail!("unknown station '{station}'");
            };
            let letter_case = if mixed_case {
                LetterCase::Mixed
            } else {
                config.letter_case()
            };
            let request = BuildRequest {
                target: date.map_or_else(yesterday, Ok)?,
                today: Local::now().date_naive(),
                remarks: String::new(),
                letter_case,
            };
            let dataset = build_station_dataset(&store, &station, &request).await?;
            print_json(&dataset)?;
        }
        Commands::ListStations => {
            let stations = store.stations().await?;
            info!(total = stations.len(), "Station list fetched");
            for station in &stations {
                info!(
                    station_id = %station.id,
                    icao = %station.icao,
                    name = %station.name,
                    latitude = station.latitude,
                    longitude = station.longitude,
                    "Station"
                );
            }
        }
    }

    Ok(())
}

/// Builds the batch, writes every report and logs one CSV row per station.
#[tracing::instrument(skip_all, fields(date = %request.target, data_dir = %config.data_dir))]
async fn build(
    store: &DirectoryStore,
    config: &ReportConfig,
    selected: &[String],
    request: &BuildRequest,
) -> Result<()> {
    let renderer = TemplateRenderer::new(&config.template_dir);

    let outcome = if selected.is_empty() {
        build_all(store, &renderer, request).await?
    } else {
        let stations: Vec<_> = store
            .stations()
            .await?
            .into_iter()
            .filter(|s| selected.contains(&s.id))
            .collect();
        if stations.len() < selected.len() {
            warn!(
                requested = selected.len(),
                found = stations.len(),
                "Some requested stations are unknown"
            );
        }
        build_for_stations(store, &renderer, &stations, request).await
    };

    let written = write_reports(&config.output_dir, &outcome.reports);
    if written < outcome.reports.len() {
        warn!(
            written,
            rendered = outcome.reports.len(),
            "Some reports could not be written"
        );
    }

    let now = Utc::now();
    for station in &outcome.stations {
        if let Err(e) = append_batch_record(&config.batch_log, &BatchRecord::from_outcome(station, now)) {
            error!(error = %e, path = %config.batch_log, "Failed to write batch log");
        }
    }

    if outcome.success {
        info!(reports = outcome.reports.len(), "All reports created");
    } else {
        warn!(message = %outcome.message, "Some reports failed");
    }
    println!("{}", outcome.message);
    Ok(())
}
