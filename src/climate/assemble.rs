//! Assembly of the keyed dataset handed to the renderer.
//!
//! Every value is already formatted to its fixed width; the renderer only
//! places strings. Daily rows come from [`DailyAccumulator`], extremes from
//! [`Extremes`], departures from [`departure::compute`].

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::climate::daily::{DailyAccumulator, DayRow};
use crate::climate::departure::{self, Departures};
use crate::climate::extremes::{
    Extremes, render_precip_24h, render_snow_24h, render_snow_depth, render_temperature,
    render_wind,
};
use crate::climate::sentinel::Amount;
use crate::climate::types::{PeriodData, PeriodSummary, Station};
use crate::climate::utility::{fixed, fixed_or_missing, int_or_missing, nint, nint_places, right};
use crate::config::LetterCase;
use crate::error::BuildError;

/// The assembled report values: one flat key/value map plus the daily rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDataset {
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
    pub days: Vec<DayRow>,
}

impl ReportDataset {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }
}

/// Identifier of a station's monthly product: ICAO id without its first
/// letter, `LCD`, and the three-letter month.
pub fn product_id(station: &Station, target: NaiveDate) -> String {
    let site: String = station.icao.chars().skip(1).collect();
    format!("{}LCD{}", site, target.format("%b").to_string().to_uppercase())
}

/// Prefixes remarks with `#FINAL-MM-YY#` once the target month has closed.
///
/// While `today` is still in the target month the remarks pass through.
pub fn finalize_remarks(target: NaiveDate, today: NaiveDate, remarks: &str) -> String {
    if target.month() == today.month() && target.year() == today.year() {
        return remarks.to_string();
    }
    let tag = format!("#FINAL-{}#", target.format("%m-%y"));
    if remarks.is_empty() {
        tag
    } else {
        format!("{tag}\n{remarks}")
    }
}

/// Degrees and minutes for the header.
///
/// Longitude degrees are made positive with direction `E` when negative,
/// while the minutes keep their sign. Latitude is never flipped; southern
/// stations keep negative degrees under `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub lat_deg: i32,
    pub lat_min: i32,
    pub lat_dir: &'static str,
    pub lon_deg: i32,
    pub lon_min: i32,
    pub lon_dir: &'static str,
}

impl Coordinates {
    pub fn from_station(station: &Station) -> Self {
        let lat_deg = station.latitude as i32;
        let lat_min = ((station.latitude - f64::from(lat_deg)) * 60.0) as i32;

        let mut lon_deg = station.longitude as i32;
        let lon_min = nint((station.longitude - f64::from(lon_deg)) * 60.0);
        let mut lon_dir = "W";
        if lon_deg < 0 {
            lon_deg = -lon_deg;
            lon_dir = "E";
        }

        Self {
            lat_deg,
            lat_min,
            lat_dir: "N",
            lon_deg,
            lon_min,
            lon_dir,
        }
    }
}

/// Builds the dataset for one station-month.
///
/// Fails with [`BuildError::AssemblyInconsistency`] if the accumulator did
/// not see exactly one row per day up to the target date.
pub fn assemble(
    station: &Station,
    target: NaiveDate,
    today: NaiveDate,
    remarks: &str,
    accumulator: DailyAccumulator,
    period: &PeriodData,
    letter_case: LetterCase,
) -> Result<ReportDataset, BuildError> {
    if accumulator.days() != target.day() as usize {
        return Err(BuildError::AssemblyInconsistency(format!(
            "expected {} daily rows for {}, found {}",
            target.day(),
            target,
            accumulator.days()
        )));
    }

    let mut data = ReportDataset {
        values: BTreeMap::new(),
        days: Vec::new(),
    };

    place_header(&mut data, station, target, letter_case);
    let mean_temp = place_sums_and_averages(&mut data, &accumulator);

    let extremes = Extremes::from_period(&period.summary, &period.wind);
    place_extremes(&mut data, &extremes);

    let departures = departure::compute(
        mean_temp,
        accumulator.last_observation(),
        &period.summary,
        &period.norm,
    );
    let (heating_month, cooling_month) =
        departure::month_to_date(accumulator.last_observation());
    place_period(&mut data, &period.summary, &departures, heating_month, cooling_month);

    data.set("remarks", finalize_remarks(target, today, remarks));
    data.days = accumulator.into_rows();

    Ok(data)
}

fn place_header(data: &mut ReportDataset, station: &Station, target: NaiveDate, case: LetterCase) {
    let month = target.format("%B").to_string();
    let month = match case {
        LetterCase::Upper => month.to_uppercase(),
        LetterCase::Mixed => month,
    };
    let coords = Coordinates::from_station(station);

    data.set("station_name", station.name.clone());
    data.set("month", month);
    data.set("year", target.format("%Y").to_string());
    data.set("lat_deg", right(coords.lat_deg, 3));
    data.set("lat_min", right(coords.lat_min, 3));
    data.set("lat_dir", coords.lat_dir);
    data.set("lon_deg", right(coords.lon_deg, 3));
    data.set("lon_min", right(coords.lon_min, 3));
    data.set("lon_dir", coords.lon_dir);
}

/// Places monthly sums and averages; returns the unrounded mean temperature.
fn place_sums_and_averages(data: &mut ReportDataset, acc: &DailyAccumulator) -> Option<f64> {
    data.set("sum_max", int_or_missing(acc.max_temp.total(), 5));
    data.set("sum_min", int_or_missing(acc.min_temp.total(), 5));
    data.set("sum_hdd", int_or_missing(acc.heating.total(), 4));
    data.set("sum_cdd", int_or_missing(acc.cooling.total(), 4));
    data.set("sum_wtr", acc.precip.render(6, 2));
    data.set("sum_snw", acc.snowfall.render(5, 1));
    data.set("sum_spd", fixed_or_missing(acc.wind_speed.total(), 6, 1));
    data.set("sum_minsun", int_or_missing(acc.minutes_sun.total(), 5));
    data.set("sum_ss", int_or_missing(acc.sky_cover.total(), 4));

    let avg_max = acc.max_temp.mean();
    let avg_min = acc.min_temp.mean();
    let mean_temp = match (avg_max, avg_min) {
        (Some(max), Some(min)) => Some((max + min) / 2.0),
        _ => None,
    };
    let tenths = |v: Option<f64>| v.map(|v| nint_places(v, 1));

    data.set("avg_max", fixed_or_missing(tenths(avg_max), 5, 1));
    data.set("avg_min", fixed_or_missing(tenths(avg_min), 5, 1));
    data.set("avg_temp", fixed_or_missing(tenths(mean_temp), 5, 1));
    data.set("avg_spd", fixed_or_missing(tenths(acc.wind_speed.mean()), 5, 1));
    data.set("avg_minsun", int_or_missing(acc.minutes_sun.mean().map(nint), 4));
    data.set("avg_psbl", int_or_missing(acc.percent_possible_sun.mean().map(nint), 5));
    data.set("avg_ss", int_or_missing(acc.sky_cover.mean().map(nint), 4));

    mean_temp
}

fn place_extremes(data: &mut ReportDataset, extremes: &Extremes) {
    let (max_spd, max_dir, max_flag) = render_wind(&extremes.max_sustained);
    data.set("max_spd", max_spd);
    data.set("max_dir", max_dir);
    data.set("max_flag", max_flag);
    let (gust_spd, gust_dir, gust_flag) = render_wind(&extremes.max_gust);
    data.set("gust_spd", gust_spd);
    data.set("gust_dir", gust_dir);
    data.set("gust_flag", gust_flag);

    let (value, day, day2) = render_temperature(&extremes.max_temp);
    data.set("max_temp", value);
    data.set("max_temp_day", day);
    data.set("max_temp_day2", day2);
    let (value, day, day2) = render_temperature(&extremes.min_temp);
    data.set("min_temp", value);
    data.set("min_temp_day", day);
    data.set("min_temp_day2", day2);

    let (value, dates) = render_precip_24h(&extremes.precip_24h);
    data.set("precip_max_24h", value);
    data.set("precip_24h_dates", dates);
    let (value, dates, on) = render_snow_24h(&extremes.snow_24h);
    data.set("snow_max_24h", value);
    data.set("snow_24h_dates", dates);
    data.set("snow_24h_on", on);

    data.set("snow_depth", render_snow_depth(&extremes.snow_depth));
}

fn snow_total(total: Amount) -> String {
    match total {
        Amount::Missing => format!("{:<13}", "  M"),
        Amount::Trace => format!("{:<13}", "  T"),
        Amount::Measured(v) if (0.0..=1.0).contains(&v) => format!("{} INCH  ", fixed(v, 6, 1)),
        Amount::Measured(v) => format!("{} INCHES", fixed(v, 6, 1)),
    }
}

fn place_period(
    data: &mut ReportDataset,
    summary: &PeriodSummary,
    departures: &Departures,
    heating_month: Option<i32>,
    cooling_month: Option<i32>,
) {
    data.set("precip_total", summary.precip_total.render(7, 2));
    data.set("snow_total", snow_total(summary.snow_total));
    data.set(
        "temp_departure",
        fixed_or_missing(departures.mean_temp.map(|d| nint_places(d, 1)), 5, 1),
    );
    data.set(
        "precip_departure",
        fixed_or_missing(departures.precip.map(|d| nint_places(d, 2)), 8, 2),
    );

    let t = &summary.thresholds;
    data.set("max_below_32", int_or_missing(t.max_below_32, 3));
    data.set("max_above_90", int_or_missing(t.max_above_90, 3));
    data.set("min_below_32", int_or_missing(t.min_below_32, 3));
    data.set("min_below_0", int_or_missing(t.min_below_0, 3));
    data.set("precip_above_01", int_or_missing(t.precip_above_01, 3));
    data.set("precip_above_10", int_or_missing(t.precip_above_10, 3));
    data.set("precip_above_50", int_or_missing(t.precip_above_50, 3));
    data.set("precip_above_100", int_or_missing(t.precip_above_100, 3));

    let sky = &summary.sky_days;
    data.set("fair_days", int_or_missing(sky.fair, 2));
    data.set("partly_cloudy_days", int_or_missing(sky.partly_cloudy, 2));
    data.set("mostly_cloudy_days", int_or_missing(sky.mostly_cloudy, 2));

    data.set("heating_month", int_or_missing(heating_month, 6));
    data.set("heating_month_departure", int_or_missing(departures.heating_month, 6));
    data.set("heating_season", int_or_missing(summary.heating.since_july_1, 6));
    data.set(
        "heating_season_departure",
        int_or_missing(departures.heating_since_july_1, 6),
    );
    data.set("cooling_month", int_or_missing(cooling_month, 6));
    data.set("cooling_month_departure", int_or_missing(departures.cooling_month, 6));
    data.set("cooling_year", int_or_missing(summary.cooling.since_january_1, 6));
    data.set(
        "cooling_year_departure",
        int_or_missing(departures.cooling_since_january_1, 6),
    );

    // pressure fields are not padded when missing
    let p = &summary.pressure;
    match p.max {
        Some(max) => {
            data.set("max_slp", fixed(max, 5, 2));
            data.set("max_slp_day", p.max_day.map_or("M".to_string(), |d| right(d, 2)));
        }
        None => {
            data.set("max_slp", "M");
            data.set("max_slp_day", "M");
        }
    }
    match p.min {
        Some(min) => {
            data.set("min_slp", fixed(min, 5, 2));
            data.set("min_slp_day", p.min_day.map_or("M".to_string(), |d| right(d, 2)));
        }
        None => {
            data.set("min_slp", "M");
            data.set("min_slp_day", "M");
        }
    }
}
