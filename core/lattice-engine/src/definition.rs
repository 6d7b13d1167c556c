//! FILENAME: core/lattice-engine/src/definition.rs
//! Report Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE how a report turns
//! sparse query rows into a grid. These structures are designed to be:
//! - Loaded from the report configuration (JSON)
//! - Passed per call, so report types with different sentinels coexist
//! - Immutable snapshots of what the caller asked for

use serde::{Deserialize, Serialize};
use engine::MetricValue;

use crate::error::{LatticeError, Result};
use crate::intervals::{labels_between, Granularity};

// ============================================================================
// ORIENTATION AND WRITE POLICY
// ============================================================================

/// Where intervals end up in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// One row per dimension combination, one slot per interval.
    /// Used for time-series charts.
    Wide,
    /// The interval is an extra key dimension: one row per
    /// (combination, interval), one slot per row. Used for flat exports.
    Deep,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Wide
    }
}

/// What happens when a second row lands in an already written slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Combine with `MetricValue::add`.
    Accumulate,
    /// Last write wins.
    Overwrite,
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::Accumulate
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// How a total is derived from the numbers it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalMode {
    /// Plain sum.
    Sum,
    /// Sum divided by the number of positive entries.
    Average,
}

/// Which totals the rendered view carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsConfig {
    /// Adds a total column to every row.
    #[serde(default)]
    pub row: Option<TotalMode>,

    /// Adds a totals row under the grid.
    #[serde(default)]
    pub column: Option<TotalMode>,

    /// Header used for the row total column.
    #[serde(default = "default_total_label")]
    pub label: String,
}

fn default_total_label() -> String {
    "total".to_string()
}

impl Default for TotalsConfig {
    fn default() -> Self {
        TotalsConfig {
            row: None,
            column: None,
            label: default_total_label(),
        }
    }
}

// ============================================================================
// REPORT DEFINITION
// ============================================================================

fn default_interval_field() -> String {
    "date".to_string()
}

fn default_sentinel() -> MetricValue {
    MetricValue::text("0.0000")
}

/// The complete description of one report grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Display name, used in log lines.
    pub name: String,

    /// Grouping dimensions for this report (e.g. `unit`, or `unit` and
    /// `environment`). May be a strict subset of the catalog's dimensions.
    pub dimensions: Vec<String>,

    /// Field on each sparse row holding the interval label.
    #[serde(default = "default_interval_field")]
    pub interval_field: String,

    /// Field on each sparse row holding the metric.
    pub value_field: String,

    #[serde(default)]
    pub granularity: Granularity,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default)]
    pub policy: WritePolicy,

    /// Value every slot starts with until a row writes to it.
    #[serde(default = "default_sentinel")]
    pub default_value: MetricValue,

    #[serde(default)]
    pub totals: TotalsConfig,
}

impl ReportDefinition {
    /// Creates a wide, accumulating definition with the `"0.0000"` sentinel.
    pub fn new<I, S>(name: &str, dimensions: I, value_field: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ReportDefinition {
            name: name.to_string(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            interval_field: default_interval_field(),
            value_field: value_field.to_string(),
            granularity: Granularity::default(),
            orientation: Orientation::default(),
            policy: WritePolicy::default(),
            default_value: default_sentinel(),
            totals: TotalsConfig::default(),
        }
    }

    pub fn with_interval_field(mut self, field: &str) -> Self {
        self.interval_field = field.to_string();
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_value(mut self, value: MetricValue) -> Self {
        self.default_value = value;
        self
    }

    pub fn with_totals(mut self, totals: TotalsConfig) -> Self {
        self.totals = totals;
        self
    }

    /// Parses and validates a definition from the report configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: ReportDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Checks the definition can address a lattice at all.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(LatticeError::NoDimensions);
        }
        for field in [&self.interval_field, &self.value_field] {
            if self.dimensions.contains(field) {
                return Err(LatticeError::ConflictingField(field.clone()));
            }
        }
        if self.interval_field == self.value_field {
            return Err(LatticeError::ConflictingField(self.value_field.clone()));
        }
        Ok(())
    }

    /// The interval labels from `start` up to, but not including, `end` at
    /// this report's granularity. Feeds the catalog's interval sequence.
    pub fn intervals(&self, start: &str, end: &str) -> Result<Vec<String>> {
        labels_between(start, end, self.granularity)
    }

    /// Sorted, deduplicated grouping dimensions.
    pub fn grouping_dimensions(&self) -> Vec<String> {
        let mut dims = self.dimensions.clone();
        dims.sort();
        dims.dedup();
        dims
    }

    /// Dimensions that make up a lattice key: the grouping dimensions, plus
    /// the interval field in deep orientation. Sorted.
    pub fn key_dimensions(&self) -> Vec<String> {
        let mut dims = self.grouping_dimensions();
        if self.orientation == Orientation::Deep {
            dims.push(self.interval_field.clone());
            dims.sort();
        }
        dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_applies_defaults() {
        let def = ReportDefinition::from_json(
            r#"{"name": "costs", "dimensions": ["unit", "environment"], "value_field": "cost"}"#,
        )
        .unwrap();

        assert_eq!(def.interval_field, "date");
        assert_eq!(def.orientation, Orientation::Wide);
        assert_eq!(def.policy, WritePolicy::Accumulate);
        assert_eq!(def.granularity, Granularity::Month);
        assert_eq!(def.default_value, MetricValue::text("0.0000"));
        assert_eq!(def.totals.label, "total");
        assert!(def.totals.row.is_none());
    }

    #[test]
    fn test_from_json_full() {
        let def = ReportDefinition::from_json(
            r#"{
                "name": "uptime",
                "dimensions": ["unit"],
                "interval_field": "day",
                "value_field": "average",
                "granularity": "day",
                "orientation": "deep",
                "policy": "overwrite",
                "default_value": 0.0,
                "totals": {"row": "average", "column": "sum"}
            }"#,
        )
        .unwrap();

        assert_eq!(def.orientation, Orientation::Deep);
        assert_eq!(def.policy, WritePolicy::Overwrite);
        assert_eq!(def.default_value, MetricValue::Float(0.0));
        assert_eq!(def.totals.row, Some(TotalMode::Average));
        assert_eq!(def.key_dimensions(), vec!["day", "unit"]);
    }

    #[test]
    fn test_intervals_follow_granularity() {
        let monthly = ReportDefinition::new("costs", ["unit"], "cost");
        assert_eq!(monthly.intervals("2024-01-20", "2024-03-05").unwrap(), vec!["2024-01", "2024-02"]);

        let yearly = monthly.clone().with_granularity(Granularity::Year);
        assert_eq!(yearly.intervals("2022-06", "2024-06").unwrap(), vec!["2022", "2023"]);

        assert!(matches!(monthly.intervals("soon", "2024-03"), Err(LatticeError::InvalidDate(_))));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            ReportDefinition::from_json(r#"{"name": "x"}"#),
            Err(LatticeError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_validate_requires_dimensions() {
        let def = ReportDefinition::new("empty", Vec::<String>::new(), "cost");
        assert!(matches!(def.validate(), Err(LatticeError::NoDimensions)));
    }

    #[test]
    fn test_validate_rejects_interval_as_dimension() {
        let def = ReportDefinition::new("bad", ["unit", "date"], "cost");
        assert!(matches!(def.validate(), Err(LatticeError::ConflictingField(f)) if f == "date"));
    }

    #[test]
    fn test_grouping_dimensions_sorted_and_deduped() {
        let def = ReportDefinition::new("costs", ["unit", "environment", "unit"], "cost");
        assert_eq!(def.grouping_dimensions(), vec!["environment", "unit"]);
        assert_eq!(def.key_dimensions(), vec!["environment", "unit"]);
    }
}
