//! Day-by-day accumulation of a month of observations.
//!
//! Each day is classified field by field: present values feed the running
//! sums and counts, missing ones render as `M` and are skipped. The
//! accumulator keeps only the running state plus the last day's observation,
//! which carries the "as of this date" degree-day totals.

use serde::Serialize;

use crate::climate::sentinel::TraceSum;
use crate::climate::types::{DailyObservation, HistoricalNorm, WeatherFlags};
use crate::climate::utility::{fixed, int_or_missing, missing, nint, right};

/// Weather flag positions and the digit each one contributes, in output order.
///
/// Positions 5 and 6 both map to `6` and contribute it once.
static WEATHER_DIGITS: &[(&[usize], char)] = &[
    (&[12], '1'),
    (&[13], '2'),
    (&[0], '3'),
    (&[11], '4'),
    (&[7], '5'),
    (&[5, 6], '6'),
    (&[16], '7'),
    (&[14], '8'),
    (&[15], '9'),
    (&[17], 'X'),
];

/// Maps a day's weather flags to the report's digit code.
pub fn weather_code(flags: &WeatherFlags) -> String {
    WEATHER_DIGITS
        .iter()
        .filter(|(positions, _)| positions.iter().any(|&p| flags.is_set(p)))
        .map(|(_, digit)| *digit)
        .collect()
}

/// Formatted fields of one day's row, keyed for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub dy: String,
    pub max: String,
    pub min: String,
    pub avg: String,
    pub dep: String,
    pub hdd: String,
    pub cdd: String,
    pub wtr: String,
    pub snw: String,
    pub dpth: String,
    pub spd: String,
    pub mxspd: String,
    pub dir: String,
    pub minsun: String,
    pub psbl: String,
    pub ss: String,
    pub ws: String,
    pub isp: String,
    pub dr: String,
}

impl DayRow {
    /// Looks up a formatted field by its column name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "dy" => &self.dy,
            "max" => &self.max,
            "min" => &self.min,
            "avg" => &self.avg,
            "dep" => &self.dep,
            "hdd" => &self.hdd,
            "cdd" => &self.cdd,
            "wtr" => &self.wtr,
            "snw" => &self.snw,
            "dpth" => &self.dpth,
            "spd" => &self.spd,
            "mxspd" => &self.mxspd,
            "dir" => &self.dir,
            "minsun" => &self.minsun,
            "psbl" => &self.psbl,
            "ss" => &self.ss,
            "ws" => &self.ws,
            "isp" => &self.isp,
            "dr" => &self.dr,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// Running sum and count of non-missing days for one variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tally<T> {
    pub sum: T,
    pub count: u32,
}

impl<T: Copy + std::ops::AddAssign> Tally<T> {
    fn add(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// The sum, or `None` when no day contributed.
    pub fn total(&self) -> Option<T> {
        (self.count > 0).then_some(self.sum)
    }
}

impl<T: Copy + Into<f64>> Tally<T> {
    /// Unrounded mean, or `None` when no day contributed.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum.into() / f64::from(self.count))
    }
}

/// Daily average temperature, only when both extremes are present.
pub fn daily_average(obs: &DailyObservation) -> Option<i32> {
    match (obs.max_temp, obs.min_temp) {
        (Some(max), Some(min)) => Some(nint(f64::from(max + min) / 2.0)),
        _ => None,
    }
}

/// The day's normal mean temperature: the combined mean when present,
/// otherwise the rounded average of the max and min means.
pub fn daily_normal(norm: &HistoricalNorm) -> Option<i32> {
    if let Some(mean) = norm.mean_temp {
        return Some(nint(mean));
    }
    match (norm.max_temp_mean, norm.min_temp_mean) {
        (Some(max), Some(min)) => Some(nint((max + min) / 2.0)),
        _ => None,
    }
}

/// Departure of the day's average temperature from normal.
pub fn daily_departure(obs: &DailyObservation, norm: &HistoricalNorm) -> Option<i32> {
    Some(daily_average(obs)? - daily_normal(norm)?)
}

/// Mutable per-station state for one month's pass.
#[derive(Debug, Clone, Default)]
pub struct DailyAccumulator {
    pub max_temp: Tally<i32>,
    pub min_temp: Tally<i32>,
    pub heating: Tally<i32>,
    pub cooling: Tally<i32>,
    pub wind_speed: Tally<f64>,
    pub minutes_sun: Tally<i32>,
    pub percent_possible_sun: Tally<i32>,
    /// Sky cover in tenths, each day rounded before summing.
    pub sky_cover: Tally<i32>,
    pub precip: TraceSum,
    pub snowfall: TraceSum,
    rows: Vec<DayRow>,
    last: Option<DailyObservation>,
}

impl DailyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one day into the running state and records its row.
    pub fn add_day(&mut self, day: u32, obs: &DailyObservation, norm: &HistoricalNorm) {
        self.max_temp.add(obs.max_temp);
        self.min_temp.add(obs.min_temp);
        self.heating.add(obs.heating_days);
        self.cooling.add(obs.cooling_days);
        self.wind_speed.add(obs.avg_wind_speed);
        self.minutes_sun.add(obs.minutes_sun);
        self.percent_possible_sun.add(obs.percent_possible_sun);
        self.sky_cover.add(sky_tenths(obs));
        self.precip.add(obs.precip);
        self.snowfall.add(obs.snowfall);

        self.rows.push(format_row(day, obs, norm));
        self.last = Some(obs.clone());
    }

    pub fn rows(&self) -> &[DayRow] {
        &self.rows
    }

    pub fn days(&self) -> usize {
        self.rows.len()
    }

    /// The most recently added observation.
    pub fn last_observation(&self) -> Option<&DailyObservation> {
        self.last.as_ref()
    }

    pub fn into_rows(self) -> Vec<DayRow> {
        self.rows
    }
}

fn sky_tenths(obs: &DailyObservation) -> Option<i32> {
    obs.sky_cover.map(|fraction| nint(fraction * 10.0))
}

fn format_row(day: u32, obs: &DailyObservation, norm: &HistoricalNorm) -> DayRow {
    let ws = match &obs.weather {
        Some(flags) => format!(" {:<4}", weather_code(flags)),
        None => format!(" {:<4}", "M"),
    };

    DayRow {
        dy: right(day, 2),
        max: int_or_missing(obs.max_temp, 4),
        min: int_or_missing(obs.min_temp, 4),
        avg: int_or_missing(daily_average(obs), 4),
        dep: int_or_missing(daily_departure(obs, norm), 4),
        hdd: int_or_missing(obs.heating_days, 4),
        cdd: int_or_missing(obs.cooling_days, 4),
        wtr: obs.precip.render(5, 2),
        snw: obs.snowfall.render(5, 1),
        dpth: obs.snow_depth.render(5, 0),
        spd: match obs.avg_wind_speed {
            Some(speed) => fixed(speed, 5, 1),
            None => missing(5),
        },
        mxspd: int_or_missing(obs.max_wind.speed.map(nint), 3),
        dir: int_or_missing(obs.max_wind.direction, 4),
        minsun: int_or_missing(obs.minutes_sun, 4),
        psbl: int_or_missing(obs.percent_possible_sun, 5),
        ss: int_or_missing(sky_tenths(obs), 4),
        ws,
        isp: int_or_missing(obs.max_gust.speed.map(nint), 3),
        dr: int_or_missing(obs.max_gust.direction, 4),
    }
}
