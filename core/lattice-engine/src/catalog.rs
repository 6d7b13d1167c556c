//! FILENAME: core/lattice-engine/src/catalog.rs
//! Dimension Catalog - every value a report's dimensions can take.
//!
//! The catalog is built fresh for each report from the distinct values the
//! query layer observed, plus the report's interval sequence. It is designed
//! for:
//! - Deterministic lattices: dimension names and values are kept in code
//!   point order, so two builds from the same input agree everywhere
//! - Honest cardinality: a dimension with no values stays in the catalog and
//!   makes every lattice that includes it empty

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use engine::MetricValue;

use crate::error::{LatticeError, Result};

// ============================================================================
// SPARSE ROWS
// ============================================================================

/// One aggregated query result row: a flat record holding some dimension
/// values, an interval label and a metric. Which field plays which role is
/// decided by the report definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseRow {
    fields: BTreeMap<String, MetricValue>,
}

impl SparseRow {
    pub fn new() -> Self {
        SparseRow::default()
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<MetricValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<MetricValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&MetricValue> {
        self.fields.get(field)
    }

    /// The field rendered as text, the way it appears inside a lattice key.
    pub fn label(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(MetricValue::display_value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionCatalog {
    /// Dimension name -> sorted, deduplicated values.
    dimensions: BTreeMap<String, Vec<String>>,

    /// Ordered interval labels covering the report range.
    intervals: Vec<String>,
}

impl DimensionCatalog {
    /// Builds a catalog from the distinct values per dimension and the
    /// report's interval sequence. Values are deduplicated and sorted;
    /// intervals keep their order, minus repeats.
    pub fn build<C, I>(columns: C, intervals: I) -> Self
    where
        C: IntoIterator<Item = (String, Vec<String>)>,
        I: IntoIterator<Item = String>,
    {
        let mut catalog = DimensionCatalog::default();
        for (dimension, values) in columns {
            catalog.add_dimension(&dimension);
            for value in values {
                catalog.insert_value(&dimension, value);
            }
        }
        catalog.set_intervals(intervals);
        catalog
    }

    /// Derives the value sets from the rows themselves: every distinct value
    /// observed for each requested dimension. Rows without a dimension field
    /// contribute nothing to it.
    pub fn from_rows<I>(rows: &[SparseRow], dimensions: &[String], intervals: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut catalog = DimensionCatalog::default();
        for dimension in dimensions {
            catalog.add_dimension(dimension);
            for row in rows {
                if let Some(value) = row.label(dimension) {
                    catalog.insert_value(dimension, value);
                }
            }
        }
        catalog.set_intervals(intervals);
        catalog
    }

    /// Registers a dimension, possibly with no values yet.
    pub fn add_dimension(&mut self, dimension: &str) {
        self.dimensions.entry(dimension.to_string()).or_default();
    }

    /// Adds a value to a dimension, keeping the set sorted and unique.
    pub fn insert_value(&mut self, dimension: &str, value: String) {
        let values = self.dimensions.entry(dimension.to_string()).or_default();
        if let Err(pos) = values.binary_search(&value) {
            values.insert(pos, value);
        }
    }

    fn set_intervals<I>(&mut self, intervals: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.intervals.clear();
        for interval in intervals {
            if !self.intervals.contains(&interval) {
                self.intervals.push(interval);
            }
        }
    }

    /// Dimension names in code point order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn contains(&self, dimension: &str) -> bool {
        self.dimensions.contains_key(dimension)
    }

    pub fn values(&self, dimension: &str) -> Option<&[String]> {
        self.dimensions.get(dimension).map(Vec::as_slice)
    }

    pub fn intervals(&self) -> &[String] {
        &self.intervals
    }

    /// Number of combinations over `dimensions`, before anything is built.
    pub fn cardinality(&self, dimensions: &[String]) -> Result<usize> {
        dimensions.iter().try_fold(1usize, |acc, dimension| {
            self.values(dimension)
                .map(|values| acc.saturating_mul(values.len()))
                .ok_or_else(|| LatticeError::UnknownDimension(dimension.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<(String, Vec<String>)> {
        vec![
            ("unit".to_string(), vec!["B".to_string(), "A".to_string(), "B".to_string()]),
            ("environment".to_string(), vec!["prod".to_string(), "dev".to_string()]),
        ]
    }

    #[test]
    fn test_build_sorts_and_dedupes() {
        let catalog = DimensionCatalog::build(columns(), vec!["2024-01".to_string()]);

        assert_eq!(catalog.dimensions().collect::<Vec<_>>(), vec!["environment", "unit"]);
        assert_eq!(catalog.values("unit").unwrap(), ["A", "B"]);
        assert_eq!(catalog.values("environment").unwrap(), ["dev", "prod"]);
    }

    #[test]
    fn test_build_sorts_by_code_point() {
        let catalog = DimensionCatalog::build(
            vec![("team".to_string(), vec!["b".to_string(), "Z".to_string(), "é".to_string(), "1".to_string()])],
            Vec::new(),
        );
        assert_eq!(catalog.values("team").unwrap(), ["1", "Z", "b", "é"]);
    }

    #[test]
    fn test_intervals_keep_order_without_repeats() {
        let intervals = ["2024-02", "2024-01", "2024-02"].map(String::from);
        let catalog = DimensionCatalog::build(columns(), intervals);
        assert_eq!(catalog.intervals(), ["2024-02", "2024-01"]);
    }

    #[test]
    fn test_cardinality() {
        let catalog = DimensionCatalog::build(columns(), Vec::new());
        let dims = vec!["unit".to_string(), "environment".to_string()];
        assert_eq!(catalog.cardinality(&dims).unwrap(), 4);
        assert!(matches!(
            catalog.cardinality(&["service".to_string()]),
            Err(LatticeError::UnknownDimension(d)) if d == "service"
        ));
    }

    #[test]
    fn test_empty_dimension_is_kept() {
        let mut cols = columns();
        cols.push(("service".to_string(), Vec::new()));
        let catalog = DimensionCatalog::build(cols, Vec::new());

        assert!(catalog.contains("service"));
        let dims = vec!["service".to_string(), "unit".to_string()];
        assert_eq!(catalog.cardinality(&dims).unwrap(), 0);
    }

    #[test]
    fn test_from_rows_collects_observed_values() {
        let rows = vec![
            SparseRow::new().with("account", "A").with("region", "eu-west-1").with("cost", "100"),
            SparseRow::new().with("account", "B").with("cost", "100"),
            SparseRow::new().with("account", "A").with("region", "us-east-1"),
        ];
        let dims = vec!["account".to_string(), "region".to_string()];
        let catalog = DimensionCatalog::from_rows(&rows, &dims, Vec::new());

        assert_eq!(catalog.values("account").unwrap(), ["A", "B"]);
        assert_eq!(catalog.values("region").unwrap(), ["eu-west-1", "us-east-1"]);
        assert!(!catalog.contains("cost"));
    }

    #[test]
    fn test_sparse_row_from_json() {
        let row: SparseRow =
            serde_json::from_str(r#"{"unit": "A", "date": "2024-01", "cost": "-1.01", "count": 3}"#).unwrap();
        assert_eq!(row.label("unit").as_deref(), Some("A"));
        assert_eq!(row.get("count"), Some(&MetricValue::Int(3)));
        assert_eq!(row.fields().count(), 4);
    }
}
