//! FILENAME: core/lattice-engine/src/engine.rs
//! Lattice Engine - turns sparse aggregate rows into a dense, trimmed grid.
//!
//! This module takes a DimensionCatalog (what values exist), the sparse rows
//! of a GROUP BY query (what data exists) and a ReportDefinition (how to lay
//! it out) and produces a DenseGrid ready for rendering.
//!
//! Algorithm:
//! 1. Build the lattice: the cartesian product of the report's key dimensions,
//!    one all-default cell per combination
//! 2. Accumulate: key every sparse row by exactly the report's dimensions and
//!    write its metric into the matching cell/slot
//! 3. Trim: drop every cell no row wrote to
//!
//! A row whose key has no cell means the catalog and the rows disagree. That
//! aborts the report; the lattice is never widened to make room.

use rustc_hash::FxHashMap;
use engine::logging::{log_debug, log_enter, log_error, log_exit};
use engine::MetricValue;

use crate::catalog::{DimensionCatalog, SparseRow};
use crate::definition::{Orientation, ReportDefinition};
use crate::error::{LatticeError, Result};
use crate::grid::DenseGrid;
use crate::key::{DimensionValue, LatticeKey};
use crate::lattice::{Cell, Lattice, LatticeBuilder};

// ============================================================================
// GRID ACCUMULATOR
// ============================================================================

/// Fills a freshly built lattice from sparse rows.
pub struct GridAccumulator<'a> {
    definition: &'a ReportDefinition,

    /// Grouping dimensions taken from each row, sorted.
    grouping: Vec<String>,

    /// Interval label -> slot index, wide orientation only.
    interval_slots: FxHashMap<&'a str, usize>,

    /// Interval labels in order, wide orientation only.
    intervals: Vec<String>,

    lattice: Lattice,

    rows_written: usize,
}

impl<'a> GridAccumulator<'a> {
    /// Validates the definition and materializes the skeleton for it.
    pub fn new(catalog: &'a DimensionCatalog, definition: &'a ReportDefinition) -> Result<Self> {
        definition.validate()?;

        let builder = LatticeBuilder::for_definition(catalog, definition)?;
        let (slot_count, interval_slots) = match definition.orientation {
            Orientation::Wide => {
                let slots = catalog
                    .intervals()
                    .iter()
                    .enumerate()
                    .map(|(i, label)| (label.as_str(), i))
                    .collect();
                (catalog.intervals().len(), slots)
            }
            Orientation::Deep => (1, FxHashMap::default()),
        };
        let lattice = builder.build(slot_count, &definition.default_value);

        Ok(GridAccumulator {
            definition,
            grouping: definition.grouping_dimensions(),
            interval_slots,
            intervals: catalog.intervals().to_vec(),
            lattice,
            rows_written: 0,
        })
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn required_label(&self, row: &SparseRow, field: &str) -> Result<String> {
        row.label(field)
            .ok_or_else(|| LatticeError::MissingField(field.to_string()))
    }

    /// The key a row addresses: its values for exactly the grouping
    /// dimensions (missing ones count as empty), plus its interval when deep.
    pub fn row_key(&self, row: &SparseRow) -> Result<LatticeKey> {
        let mut pairs: Vec<DimensionValue> = self
            .grouping
            .iter()
            .map(|dim| DimensionValue::new(dim.as_str(), row.label(dim).unwrap_or_default()))
            .collect();

        if self.definition.orientation == Orientation::Deep {
            let interval = self.required_label(row, &self.definition.interval_field)?;
            pairs.push(DimensionValue::new(self.definition.interval_field.as_str(), interval));
        }

        Ok(LatticeKey::new(pairs))
    }

    /// Writes one sparse row into its cell.
    pub fn accumulate(&mut self, row: &SparseRow) -> Result<()> {
        let key = self.row_key(row)?;
        let value: MetricValue = row
            .get(&self.definition.value_field)
            .cloned()
            .ok_or_else(|| LatticeError::MissingField(self.definition.value_field.clone()))?;

        let slot_index = match self.definition.orientation {
            Orientation::Deep => 0,
            Orientation::Wide => {
                let interval = self.required_label(row, &self.definition.interval_field)?;
                match self.interval_slots.get(interval.as_str()) {
                    Some(&i) => i,
                    None => {
                        log_error!(
                            "ENGINE",
                            "report {}: interval [{}] outside the known sequence",
                            self.definition.name,
                            interval
                        );
                        return Err(LatticeError::MissingIntervalSlot {
                            key: key.encode(),
                            interval,
                        });
                    }
                }
            }
        };

        let policy = self.definition.policy;
        let slot = match self.lattice.get_mut(&key) {
            Some(cell) => cell.slot_mut(slot_index),
            None => None,
        };

        match slot {
            Some(slot) => {
                slot.write(value, policy);
                self.rows_written += 1;
                Ok(())
            }
            None => {
                log_error!(
                    "ENGINE",
                    "report {}: no lattice cell for key [{}]",
                    self.definition.name,
                    key
                );
                Err(LatticeError::MissingLatticeCell { key: key.encode() })
            }
        }
    }

    /// Writes every row, stopping at the first contract violation.
    pub fn accumulate_all<'r, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'r SparseRow>,
    {
        for row in rows {
            self.accumulate(row)?;
        }
        Ok(())
    }

    /// Trims the lattice and hands back the grid.
    pub fn finish(self) -> DenseGrid {
        let dimensions = self.lattice.dimensions().to_vec();
        let slot_labels = match self.definition.orientation {
            Orientation::Wide => self.intervals.clone(),
            Orientation::Deep => vec![self.definition.value_field.clone()],
        };

        DenseGrid::new(
            self.definition.orientation,
            dimensions,
            slot_labels,
            self.intervals,
            self.definition.default_value.clone(),
            trim(self.lattice),
        )
    }
}

// ============================================================================
// SPARSE TRIMMER
// ============================================================================

/// Keeps only the cells at least one row wrote to, in lattice order. A
/// partially written wide cell survives whole, its other slots still at the
/// sentinel.
pub fn trim(lattice: Lattice) -> Vec<(LatticeKey, Cell)> {
    lattice
        .into_entries()
        .into_iter()
        .filter(|(_, cell)| cell.is_touched())
        .collect()
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Builds the dense, trimmed grid for one report. Pure: every structure is
/// built from the arguments and dropped when the grid is returned.
pub fn densify(
    catalog: &DimensionCatalog,
    rows: &[SparseRow],
    definition: &ReportDefinition,
) -> Result<DenseGrid> {
    log_enter!(
        "ENGINE",
        "densify",
        "report={} rows={} orientation={:?} policy={:?}",
        definition.name,
        rows.len(),
        definition.orientation,
        definition.policy
    );

    let mut accumulator = GridAccumulator::new(catalog, definition)?;
    accumulator.accumulate_all(rows)?;
    log_debug!(
        "ENGINE",
        "report {}: wrote {} rows into {} cells",
        definition.name,
        accumulator.rows_written(),
        accumulator.lattice.len()
    );

    let grid = accumulator.finish();
    log_exit!("ENGINE", "densify", "kept {} rows", grid.len());
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::WritePolicy;

    fn catalog() -> DimensionCatalog {
        DimensionCatalog::build(
            vec![
                ("unit".to_string(), vec!["A".to_string(), "B".to_string()]),
                ("environment".to_string(), vec!["development".to_string()]),
            ],
            ["2024-01", "2024-02", "2024-03"].map(String::from),
        )
    }

    fn row(unit: &str, env: &str, date: &str, cost: &str) -> SparseRow {
        SparseRow::new()
            .with("unit", unit)
            .with("environment", env)
            .with("date", date)
            .with("cost", cost)
    }

    fn wide() -> ReportDefinition {
        ReportDefinition::new("costs", ["unit", "environment"], "cost")
    }

    #[test]
    fn test_wide_end_to_end() {
        let rows = vec![
            row("A", "development", "2024-01", "-1.01"),
            row("A", "development", "2024-02", "3.01"),
            row("B", "development", "2024-01", "10.0"),
        ];
        let grid = densify(&catalog(), &rows, &wide()).unwrap();

        assert_eq!(grid.len(), 2);
        let keys: Vec<String> = grid.rows().map(|(k, _)| k.encode()).collect();
        assert_eq!(
            keys,
            vec!["environment:development^unit:A^", "environment:development^unit:B^"]
        );

        let a = grid.get_encoded("environment:development^unit:A^").unwrap();
        assert_eq!(
            a.values().collect::<Vec<_>>(),
            vec![&MetricValue::text("-1.01"), &MetricValue::text("3.01"), &MetricValue::text("0.0000")]
        );
        let b = grid.get_encoded("environment:development^unit:B^").unwrap();
        assert_eq!(
            b.values().collect::<Vec<_>>(),
            vec![&MetricValue::text("10.0"), &MetricValue::text("0.0000"), &MetricValue::text("0.0000")]
        );
    }

    #[test]
    fn test_wide_accumulates_duplicates() {
        let rows = vec![
            row("A", "development", "2024-01", "1"),
            row("A", "development", "2024-01", "2.1"),
        ];
        let grid = densify(&catalog(), &rows, &wide()).unwrap();
        assert_eq!(
            grid.value("environment:development^unit:A^", "2024-01"),
            Some(&MetricValue::text("3.1"))
        );
    }

    #[test]
    fn test_wide_overwrite_keeps_last() {
        let rows = vec![
            row("A", "development", "2024-01", "1"),
            row("A", "development", "2024-01", "2.1"),
        ];
        let def = wide().with_policy(WritePolicy::Overwrite);
        let grid = densify(&catalog(), &rows, &def).unwrap();
        assert_eq!(
            grid.value("environment:development^unit:A^", "2024-01"),
            Some(&MetricValue::text("2.1"))
        );
    }

    #[test]
    fn test_first_write_replaces_float_sentinel() {
        let rows = vec![SparseRow::new().with("unit", "A").with("date", "2024-02").with("hours", 5i64)];
        let def = ReportDefinition::new("uptime", ["unit"], "hours").with_default_value(MetricValue::Float(0.0));
        let grid = densify(&catalog(), &rows, &def).unwrap();

        let cell = grid.get_encoded("unit:A^").unwrap();
        // The Int write replaced the Float sentinel instead of being dropped by add.
        assert_eq!(cell.slot(1).unwrap().value(), &MetricValue::Int(5));
        assert_eq!(cell.slot(0).unwrap().value(), &MetricValue::Float(0.0));
        assert_eq!(cell.touched_count(), 1);
    }

    #[test]
    fn test_grouping_subset_of_catalog() {
        let rows = vec![
            row("A", "development", "2024-01", "1"),
            row("A", "development", "2024-03", "2"),
        ];
        let def = ReportDefinition::new("by unit", ["unit"], "cost");
        let grid = densify(&catalog(), &rows, &def).unwrap();

        assert_eq!(grid.dimensions(), ["unit"]);
        assert_eq!(grid.len(), 1);
        assert!(grid.get_encoded("unit:A^").is_some());
    }

    #[test]
    fn test_missing_lattice_cell_aborts() {
        let rows = vec![row("C", "development", "2024-01", "1")];
        let result = densify(&catalog(), &rows, &wide());
        assert!(matches!(
            result,
            Err(LatticeError::MissingLatticeCell { key }) if key == "environment:development^unit:C^"
        ));
    }

    #[test]
    fn test_row_missing_dimension_is_empty_value() {
        let rows = vec![SparseRow::new().with("unit", "A").with("date", "2024-01").with("cost", "1")];
        let result = densify(&catalog(), &rows, &wide());
        assert!(matches!(
            result,
            Err(LatticeError::MissingLatticeCell { key }) if key == "environment:^unit:A^"
        ));
    }

    #[test]
    fn test_unknown_interval_rejected() {
        let rows = vec![row("A", "development", "2023-12", "1")];
        let result = densify(&catalog(), &rows, &wide());
        assert!(matches!(
            result,
            Err(LatticeError::MissingIntervalSlot { interval, .. }) if interval == "2023-12"
        ));
    }

    #[test]
    fn test_missing_value_field() {
        let rows = vec![SparseRow::new().with("unit", "A").with("environment", "development").with("date", "2024-01")];
        let result = densify(&catalog(), &rows, &wide());
        assert!(matches!(result, Err(LatticeError::MissingField(f)) if f == "cost"));
    }

    #[test]
    fn test_deep_rows_per_interval() {
        let rows = vec![
            row("A", "development", "2024-01", "-1.01"),
            row("A", "development", "2024-02", "3.01"),
            row("B", "development", "2024-01", "10.0"),
        ];
        let def = wide().with_orientation(Orientation::Deep);
        let grid = densify(&catalog(), &rows, &def).unwrap();

        assert_eq!(grid.dimensions(), ["date", "environment", "unit"]);
        assert_eq!(grid.slot_labels(), ["cost"]);
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid.value("date:2024-02^environment:development^unit:A^", "cost"),
            Some(&MetricValue::text("3.01"))
        );
        assert!(grid.get_encoded("date:2024-02^environment:development^unit:B^").is_none());
    }

    #[test]
    fn test_deep_accumulate_and_overwrite() {
        let rows = vec![
            row("A", "development", "2024-01", "1"),
            row("A", "development", "2024-01", "2.1"),
        ];
        let key = "date:2024-01^environment:development^unit:A^";

        let summed = densify(&catalog(), &rows, &wide().with_orientation(Orientation::Deep)).unwrap();
        assert_eq!(summed.value(key, "cost"), Some(&MetricValue::text("3.1")));

        let last = densify(
            &catalog(),
            &rows,
            &wide()
                .with_orientation(Orientation::Deep)
                .with_policy(WritePolicy::Overwrite),
        )
        .unwrap();
        assert_eq!(last.value(key, "cost"), Some(&MetricValue::text("2.1")));
    }

    #[test]
    fn test_deep_missing_interval_field() {
        let rows = vec![SparseRow::new().with("unit", "A").with("environment", "development").with("cost", "1")];
        let result = densify(&catalog(), &rows, &wide().with_orientation(Orientation::Deep));
        assert!(matches!(result, Err(LatticeError::MissingField(f)) if f == "date"));
    }

    #[test]
    fn test_no_rows_gives_empty_grid() {
        let grid = densify(&catalog(), &[], &wide()).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.intervals().len(), 3);
    }

    #[test]
    fn test_trim_drops_untouched_only() {
        let catalog = catalog();
        let def = wide();
        let mut acc = GridAccumulator::new(&catalog, &def).unwrap();
        acc.accumulate(&row("B", "development", "2024-03", "4")).unwrap();
        let grid = acc.finish();

        assert_eq!(grid.len(), 1);
        let cell = grid.get_encoded("environment:development^unit:B^").unwrap();
        assert_eq!(cell.slots().len(), 3);
        assert_eq!(cell.touched_count(), 1);
    }
}
