//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the metric value carried by every report grid slot.
//! CONTEXT: Aggregate queries hand back integers (counts), floats (uptime
//! averages) or decimal strings (costs, which SQLite stores as text).
//! `MetricValue` keeps the three apart and owns the accumulation rule applied
//! when two sparse rows land in the same slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single metric as it flows from the query layer to the renderer.
///
/// Serialized untagged, so a grid renders exactly as the query produced it:
/// `3`, `0.25` or `"12.0100"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub fn text(s: impl Into<String>) -> Self {
        MetricValue::Text(s.into())
    }

    /// Short name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricValue::Int(_) => "int",
            MetricValue::Float(_) => "float",
            MetricValue::Text(_) => "text",
        }
    }

    /// Adds `incoming` to this value. The variant of `self` governs:
    ///
    /// - `Int + Int` and `Float + Float` are ordinary addition.
    /// - `Text + Text` sums both sides when they parse as base-10 floats and
    ///   writes the result back in shortest round-trip form; any other pair of
    ///   strings is concatenated.
    /// - An `incoming` value of a different variant is ignored and `self` is
    ///   returned unchanged.
    ///
    /// The last rule silently discards data (`Int(1).add(&Float(2.0))` is
    /// `Int(1)`). Report types rely on the current behaviour, so it stays.
    pub fn add(&self, incoming: &MetricValue) -> MetricValue {
        match (self, incoming) {
            (MetricValue::Int(a), MetricValue::Int(b)) => MetricValue::Int(a.saturating_add(*b)),
            (MetricValue::Float(a), MetricValue::Float(b)) => MetricValue::Float(a + b),
            (MetricValue::Text(a), MetricValue::Text(b)) => add_text(a, b),
            _ => self.clone(),
        }
    }

    /// Folds every value in `rest` into `self` with [`MetricValue::add`].
    pub fn add_all<'a, I>(&self, rest: I) -> MetricValue
    where
        I: IntoIterator<Item = &'a MetricValue>,
    {
        rest.into_iter().fold(self.clone(), |acc, next| acc.add(next))
    }

    /// Numeric reading of the value, if it has one. Text only counts when it
    /// parses as a finite base-10 float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(i) => Some(*i as f64),
            MetricValue::Float(f) => Some(*f),
            MetricValue::Text(s) => parse_number(s),
        }
    }

    /// Returns the value as it should appear in a table cell or a key.
    pub fn display_value(&self) -> String {
        match self {
            MetricValue::Int(i) => i.to_string(),
            MetricValue::Float(f) => format_float(*f),
            MetricValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Int(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

/// Formats a float in the shortest form that parses back to the same value
/// (`3.1`, `6`, `-0.5`).
pub fn format_float(value: f64) -> String {
    format!("{}", value)
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn add_text(current: &str, incoming: &str) -> MetricValue {
    match (parse_number(current), parse_number(incoming)) {
        (Some(a), Some(b)) => MetricValue::Text(format_float(a + b)),
        _ => MetricValue::Text(format!("{}{}", current, incoming)),
    }
}
