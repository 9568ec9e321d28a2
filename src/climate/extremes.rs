//! Monthly extremes with their tie lists.
//!
//! The period aggregate supplies chronological tie lists; only the first two
//! entries are ever shown. Wind extremes carry a `#` flag when more than one
//! day shares the maximum.

use crate::climate::sentinel::Amount;
use crate::climate::types::{DaySpan, ExtremeWindRecord, PeriodSummary, Wind};
use crate::climate::utility::{fixed, int_or_missing, nint, right};

/// An extreme value with up to two tied days.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DatedExtreme<T> {
    pub value: Option<T>,
    pub first_day: Option<u32>,
    pub second_day: Option<u32>,
}

impl<T: Copy> DatedExtreme<T> {
    /// Reads the first two entries of a tie list. A `None` day is the
    /// missing-date sentinel and is never shown.
    pub fn from_ties(value: Option<T>, days: &[Option<u32>]) -> Self {
        Self {
            value,
            first_day: days.first().copied().flatten(),
            second_day: days.get(1).copied().flatten(),
        }
    }
}

/// A 24-hour maximum amount and the span of its first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpanExtreme {
    pub value: Amount,
    pub span: Option<DaySpan>,
}

impl SpanExtreme {
    fn from_spans(value: Amount, spans: &[DaySpan]) -> Self {
        Self {
            value,
            span: spans.first().copied().filter(|s| s.start.is_some()),
        }
    }
}

/// Greatest snow depth on the ground during the month.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SnowDepthExtreme {
    #[default]
    Missing,
    Trace,
    Zero,
    Depth(DatedExtreme<i32>),
}

/// Highest wind of the month and whether other days tied it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindExtreme {
    pub wind: Option<Wind>,
    pub tied: bool,
}

impl WindExtreme {
    fn from_ties(ties: &[Wind]) -> Self {
        Self {
            wind: ties.first().copied(),
            tied: ties.len() > 1,
        }
    }
}

/// All extremes for one station-month.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extremes {
    pub max_temp: DatedExtreme<i32>,
    pub min_temp: DatedExtreme<i32>,
    pub precip_24h: SpanExtreme,
    pub snow_24h: SpanExtreme,
    pub snow_depth: SnowDepthExtreme,
    pub max_sustained: WindExtreme,
    pub max_gust: WindExtreme,
}

impl Extremes {
    pub fn from_period(summary: &PeriodSummary, wind: &ExtremeWindRecord) -> Self {
        let snow_depth = match summary.snow_depth_max {
            Amount::Missing => SnowDepthExtreme::Missing,
            Amount::Trace => SnowDepthExtreme::Trace,
            Amount::Measured(v) if nint(v) == 0 => SnowDepthExtreme::Zero,
            Amount::Measured(v) => SnowDepthExtreme::Depth(DatedExtreme::from_ties(
                Some(nint(v)),
                &summary.snow_depth_max_days,
            )),
        };

        Self {
            max_temp: DatedExtreme::from_ties(summary.max_temp, &summary.max_temp_days),
            min_temp: DatedExtreme::from_ties(summary.min_temp, &summary.min_temp_days),
            precip_24h: SpanExtreme::from_spans(summary.precip_max_24h, &summary.precip_24h_dates),
            snow_24h: SpanExtreme::from_spans(summary.snow_max_24h, &summary.snow_24h_dates),
            snow_depth,
            max_sustained: WindExtreme::from_ties(&wind.max_sustained),
            max_gust: WindExtreme::from_ties(&wind.max_gust),
        }
    }
}

/// Rendered value, primary day and secondary day of a temperature extreme.
pub fn render_temperature(extreme: &DatedExtreme<i32>) -> (String, String, String) {
    match extreme.value {
        Some(value) => (
            right(value, 4),
            extreme
                .first_day
                .map(|d| right(d, 2))
                .unwrap_or_else(|| " M".to_string()),
            extreme
                .second_day
                .map(|d| format!(",{:>2}", d))
                .unwrap_or_else(|| "  ".to_string()),
        ),
        None => (right("M", 4), " M".to_string(), "  ".to_string()),
    }
}

fn render_span(span: &DaySpan) -> String {
    let end = span
        .end
        .map(|d| right(d, 2))
        .unwrap_or_else(|| " M".to_string());
    match span.start {
        Some(start) => format!("{:>2}-{}", start, end),
        None => " M".to_string(),
    }
}

/// Rendered 24-hour maximum precipitation and its dates.
pub fn render_precip_24h(extreme: &SpanExtreme) -> (String, String) {
    match extreme.value {
        Amount::Missing => (right("M", 6), " M ".to_string()),
        value => (
            value.render(5, 2),
            extreme
                .span
                .as_ref()
                .map(render_span)
                .unwrap_or_else(|| " M".to_string()),
        ),
    }
}

/// Rendered 24-hour maximum snowfall, its dates and the `ON` connector.
pub fn render_snow_24h(extreme: &SpanExtreme) -> (String, String, String) {
    let dates = || {
        extreme
            .span
            .as_ref()
            .map(render_span)
            .unwrap_or_else(|| "  M  ".to_string())
    };
    match extreme.value {
        Amount::Missing => ("   M ".to_string(), "  M  ".to_string(), "ON".to_string()),
        Amount::Measured(v) if v == 0.0 => {
            (" 0.0 ".to_string(), "     ".to_string(), "  ".to_string())
        }
        Amount::Trace => ("  T  ".to_string(), dates(), "ON".to_string()),
        Amount::Measured(v) => (fixed(v, 5, 1), dates(), "ON".to_string()),
    }
}

/// Rendered snow depth maximum, padded to 12 columns.
pub fn render_snow_depth(extreme: &SnowDepthExtreme) -> String {
    let text = match extreme {
        SnowDepthExtreme::Missing => " M  ON   M".to_string(),
        SnowDepthExtreme::Trace => " T".to_string(),
        SnowDepthExtreme::Zero => " 0".to_string(),
        SnowDepthExtreme::Depth(depth) => {
            let mut text = int_or_missing(depth.value, 3);
            match depth.first_day {
                Some(day) => text.push_str(&format!(" ON {:>2}", day)),
                None => text.push_str(" ON M"),
            }
            if let Some(day) = depth.second_day {
                text.push_str(&format!(",{:>2}", day));
            }
            text
        }
    };
    format!("{:<12}", text)
}

/// Rendered speed, direction and tie flag of a wind extreme.
pub fn render_wind(extreme: &WindExtreme) -> (String, String, String) {
    let flag = if extreme.tied { "#" } else { " " }.to_string();
    match extreme.wind {
        Some(wind) => (
            int_or_missing(wind.speed.map(nint), 3),
            int_or_missing(wind.direction, 3),
            flag,
        ),
        None => (right("M", 3), right("M", 3), flag),
    }
}
