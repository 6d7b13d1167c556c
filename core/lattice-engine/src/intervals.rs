//! FILENAME: core/lattice-engine/src/intervals.rs
//! Interval sequences - the time axis of a report.
//!
//! A report covers `[start, end)` at a fixed granularity. Both bounds are
//! reset to the start of their interval before stepping, so a month report
//! from `2024-01-15` to `2024-04-03` covers January to March.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, Result};

/// Width of one interval on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Month
    }
}

impl Granularity {
    /// chrono format string for labels at this granularity.
    pub fn label_format(&self) -> &'static str {
        match self {
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        }
    }

    /// Moves `date` back to the first day of its interval.
    pub fn reset(&self, date: NaiveDate) -> NaiveDate {
        let reset = match self {
            Granularity::Day => Some(date),
            Granularity::Month => date.with_day(1),
            Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        reset.unwrap_or(date)
    }

    /// The start of the next interval, or `None` past chrono's date range.
    pub fn step(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => date.succ_opt(),
            Granularity::Month => date.checked_add_months(Months::new(1)),
            Granularity::Year => date.checked_add_months(Months::new(12)),
        }
    }

    pub fn label(&self, date: NaiveDate) -> String {
        date.format(self.label_format()).to_string()
    }
}

/// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. Anything longer is read by its
/// leading `YYYY-MM-DD`, so full timestamps are accepted too.
pub fn parse_date(label: &str) -> Result<NaiveDate> {
    let invalid = || LatticeError::InvalidDate(label.to_string());

    let parsed = match label.len() {
        4 => label
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        7 => NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d").ok(),
        n if n >= 10 => label
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
        _ => None,
    };

    parsed.ok_or_else(invalid)
}

/// Every interval label from `start` up to, but not including, `end`.
pub fn interval_labels(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<String> {
    let end = granularity.reset(end);
    let mut current = granularity.reset(start);
    let mut labels = Vec::new();

    while current < end {
        labels.push(granularity.label(current));
        match granularity.step(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    labels
}

/// [`interval_labels`] for string bounds such as `"2024-01"`.
pub fn labels_between(start: &str, end: &str, granularity: Granularity) -> Result<Vec<String>> {
    Ok(interval_labels(parse_date(start)?, parse_date(end)?, granularity))
}
