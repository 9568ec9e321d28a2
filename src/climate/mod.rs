//! Monthly climate summary computation.
//!
//! This module walks a month of daily observations, folds them into running
//! sums with missing and trace handling, reads extremes and departures from
//! the period aggregate, and assembles the fixed-width values a report
//! renderer needs.

pub mod assemble;
pub mod daily;
pub mod departure;
pub mod extremes;
pub mod sentinel;
pub mod types;
pub mod utility;
