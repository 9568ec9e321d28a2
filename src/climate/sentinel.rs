//! Missing and trace handling for precipitation and snowfall amounts.
//!
//! [`Amount`] is the tagged value for fields that may report a trace.
//! Fields that can only be present or missing use `Option<T>` directly.
//! [`TraceSum`] folds a month of amounts without ever doing arithmetic on a
//! sentinel.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::climate::utility::{fixed, right};

/// A precipitation or snow amount: measured, too small to measure, or absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Amount {
    #[default]
    Missing,
    Trace,
    Measured(f64),
}

impl Amount {
    pub fn is_missing(&self) -> bool {
        matches!(self, Amount::Missing)
    }

    /// The measured value, if any. Trace and missing yield `None`.
    pub fn measured(&self) -> Option<f64> {
        match self {
            Amount::Measured(v) => Some(*v),
            _ => None,
        }
    }

    /// Renders right-aligned in `width`, `T` for trace and `M` for missing.
    pub fn render(&self, width: usize, precision: usize) -> String {
        match self {
            Amount::Missing => right("M", width),
            Amount::Trace => right("T", width),
            Amount::Measured(v) => fixed(*v, width, precision),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Missing => serializer.serialize_str("M"),
            Amount::Trace => serializer.serialize_str("T"),
            Amount::Measured(v) => serializer.serialize_f64(*v),
        }
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, \"T\" for trace, or \"M\"/empty for missing")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Ok(Amount::Measured(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::Measured(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::Measured(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        match v.trim() {
            "" | "M" | "m" => Ok(Amount::Missing),
            "T" | "t" => Ok(Amount::Trace),
            other => other
                .parse::<f64>()
                .map(Amount::Measured)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::Missing)
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::Missing)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// State of a running trace-aware sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceState {
    /// Only zero amounts seen so far.
    Zero,
    /// At least one trace, no positive amount.
    Trace,
    /// At least one positive amount; trace designation dropped.
    Positive(f64),
}

/// Running sum of daily amounts following the trace accumulation rules.
///
/// Missing inputs never change the state; they only set `saw_missing`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSum {
    state: TraceState,
    contributions: usize,
    saw_missing: bool,
}

impl Default for TraceSum {
    fn default() -> Self {
        Self {
            state: TraceState::Zero,
            contributions: 0,
            saw_missing: false,
        }
    }
}

impl TraceSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, amount: Amount) {
        let next = match (self.state, amount) {
            (_, Amount::Missing) => {
                self.saw_missing = true;
                return;
            }
            (TraceState::Zero, Amount::Trace) => TraceState::Trace,
            (TraceState::Zero | TraceState::Trace, Amount::Measured(x)) if x > 0.0 => {
                TraceState::Positive(x)
            }
            (TraceState::Positive(sum), Amount::Measured(x)) => TraceState::Positive(sum + x),
            (state, _) => state,
        };
        self.state = next;
        self.contributions += 1;
    }

    pub fn state(&self) -> TraceState {
        self.state
    }

    /// Number of non-missing days folded in (trace and zero included).
    pub fn contributions(&self) -> usize {
        self.contributions
    }

    pub fn saw_missing(&self) -> bool {
        self.saw_missing
    }

    /// The sum as an [`Amount`]; missing when nothing contributed.
    pub fn total(&self) -> Amount {
        if self.contributions == 0 {
            return Amount::Missing;
        }
        match self.state {
            TraceState::Zero => Amount::Measured(0.0),
            TraceState::Trace => Amount::Trace,
            TraceState::Positive(sum) => Amount::Measured(sum),
        }
    }

    pub fn render(&self, width: usize, precision: usize) -> String {
        self.total().render(width, precision)
    }
}

impl FromIterator<Amount> for TraceSum {
    fn from_iter<I: IntoIterator<Item = Amount>>(iter: I) -> Self {
        let mut sum = TraceSum::new();
        for amount in iter {
            sum.add(amount);
        }
        sum
    }
}
