//! Observed-minus-normal arithmetic for the monthly summary.

use crate::climate::sentinel::Amount;
use crate::climate::types::{DailyObservation, PeriodNorm, PeriodSummary};

/// Departures computed for one station-month. `None` is missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Departures {
    pub mean_temp: Option<f64>,
    pub precip: Option<f64>,
    pub heating_month: Option<i32>,
    pub heating_since_july_1: Option<i32>,
    pub cooling_month: Option<i32>,
    pub cooling_since_january_1: Option<i32>,
}

/// Precipitation (or snow) departure with trace on either side.
///
/// A trace counts as zero against a real amount; trace against trace is zero.
pub fn amount_departure(observed: Amount, normal: Amount) -> Option<f64> {
    match (observed, normal) {
        (Amount::Missing, _) | (_, Amount::Missing) => None,
        (Amount::Trace, Amount::Trace) => Some(0.0),
        (Amount::Trace, Amount::Measured(n)) => Some(-n),
        (Amount::Measured(o), Amount::Trace) => Some(o),
        (Amount::Measured(o), Amount::Measured(n)) => Some(o - n),
    }
}

/// Integer degree-day departure; missing if either side is missing.
pub fn degree_day_departure(observed: Option<i32>, normal: Option<i32>) -> Option<i32> {
    Some(observed? - normal?)
}

/// Month-to-date heating and cooling totals as of the last day.
///
/// Read only from the last observation's cumulative fields. A last day that
/// could not be fetched is the missing placeholder, so both totals are missing.
pub fn month_to_date(last: Option<&DailyObservation>) -> (Option<i32>, Option<i32>) {
    let heating = last.and_then(|obs| obs.heating_to_date.month_to_date);
    let cooling = last.and_then(|obs| obs.cooling_to_date.month_to_date);
    (heating, cooling)
}

/// Computes every departure for the month.
///
/// `mean_temp` is the average of the daily-accumulated max and min averages.
/// The temperature departure is also missing when the period aggregate has
/// no mean temperature of its own.
pub fn compute(
    mean_temp: Option<f64>,
    last: Option<&DailyObservation>,
    summary: &PeriodSummary,
    norm: &PeriodNorm,
) -> Departures {
    let mean_temp = match (mean_temp, summary.mean_temp, norm.mean_temp) {
        (Some(observed), Some(_), Some(normal)) => Some(observed - normal),
        _ => None,
    };
    let (heating_month, cooling_month) = month_to_date(last);

    Departures {
        mean_temp,
        precip: amount_departure(summary.precip_total, norm.precip_total),
        heating_month: degree_day_departure(heating_month, norm.heating.month_to_date),
        heating_since_july_1: degree_day_departure(
            summary.heating.since_july_1,
            norm.heating.since_july_1,
        ),
        cooling_month: degree_day_departure(cooling_month, norm.cooling.month_to_date),
        cooling_since_january_1: degree_day_departure(
            summary.cooling.since_january_1,
            norm.cooling.since_january_1,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::types::DegreeDayEpochs;

    #[test]
    fn test_amount_departure_combinator() {
        assert_eq!(amount_departure(Amount::Trace, Amount::Trace), Some(0.0));
        assert_eq!(
            amount_departure(Amount::Trace, Amount::Measured(1.25)),
            Some(-1.25)
        );
        assert_eq!(
            amount_departure(Amount::Measured(0.75), Amount::Trace),
            Some(0.75)
        );
        let d = amount_departure(Amount::Measured(3.0), Amount::Measured(2.5)).unwrap();
        assert!((d - 0.5).abs() < 1e-9);
        assert_eq!(amount_departure(Amount::Missing, Amount::Measured(1.0)), None);
        assert_eq!(amount_departure(Amount::Trace, Amount::Missing), None);
    }

    #[test]
    fn test_degree_day_departure() {
        assert_eq!(degree_day_departure(Some(410), Some(380)), Some(30));
        assert_eq!(degree_day_departure(None, Some(380)), None);
        assert_eq!(degree_day_departure(Some(12), None), None);
    }

    #[test]
    fn test_compute_uses_last_day_for_month_to_date() {
        let last = DailyObservation {
            heating_to_date: DegreeDayEpochs {
                month_to_date: Some(300),
                ..Default::default()
            },
            cooling_to_date: DegreeDayEpochs {
                month_to_date: Some(4),
                ..Default::default()
            },
            ..DailyObservation::missing()
        };
        let summary = PeriodSummary {
            mean_temp: Some(41.0),
            precip_total: Amount::Measured(2.1),
            heating: DegreeDayEpochs {
                month_to_date: Some(999),
                since_july_1: Some(2500),
                since_january_1: None,
            },
            cooling: DegreeDayEpochs {
                since_january_1: Some(10),
                ..Default::default()
            },
            ..Default::default()
        };
        let norm = PeriodNorm {
            mean_temp: Some(40.0),
            precip_total: Amount::Measured(2.6),
            heating: DegreeDayEpochs {
                month_to_date: Some(320),
                since_july_1: Some(2400),
                since_january_1: None,
            },
            cooling: DegreeDayEpochs {
                month_to_date: Some(1),
                since_july_1: None,
                since_january_1: Some(3),
            },
        };

        let d = compute(Some(42.5), Some(&last), &summary, &norm);
        assert_eq!(d.mean_temp, Some(2.5));
        assert!((d.precip.unwrap() + 0.5).abs() < 1e-9);
        assert_eq!(d.heating_month, Some(-20));
        assert_eq!(d.heating_since_july_1, Some(100));
        assert_eq!(d.cooling_month, Some(3));
        assert_eq!(d.cooling_since_january_1, Some(7));
    }

    #[test]
    fn test_compute_missing_operands() {
        let summary = PeriodSummary::default();
        let norm = PeriodNorm {
            mean_temp: Some(40.0),
            ..Default::default()
        };
        let d = compute(Some(42.5), None, &summary, &norm);
        assert_eq!(d, Departures::default());
    }

    #[test]
    fn test_month_to_date_ignores_period_counter() {
        let summary = PeriodSummary {
            heating: DegreeDayEpochs {
                month_to_date: Some(55),
                ..Default::default()
            },
            ..Default::default()
        };
        let last = DailyObservation::missing();
        assert_eq!(month_to_date(Some(&last)), (None, None));

        let d = compute(None, Some(&last), &summary, &PeriodNorm::default());
        assert_eq!(d.heating_month, None);
    }
}
