//! FILENAME: core/lattice-engine/src/view.rs
//! Grid View - Renderable output for the API and dashboards.
//!
//! This module turns a DenseGrid into the ordered structure the JSON
//! serializer and HTML templates consume. It includes:
//! - The header row (dimension names, slot labels, total column)
//! - One row per kept key with its decoded dimension labels
//! - Optional row totals and a column totals row

use serde::{Deserialize, Serialize};
use engine::{format_float, MetricValue};

use crate::definition::TotalsConfig;
use crate::error::{LatticeError, Result};
use crate::grid::DenseGrid;
use crate::key::LatticeKey;
use crate::totals::{column_totals, grand_total, row_total};

// ============================================================================
// VIEW TYPES
// ============================================================================

/// A single table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridViewRow {
    /// Canonical lattice key, stable across requests.
    pub key: String,

    /// Dimension values, aligned with `GridView::dimensions`.
    pub labels: Vec<String>,

    /// Slot values, aligned with `GridView::slot_labels`.
    pub values: Vec<MetricValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<MetricValue>,
}

/// The column totals row rendered under the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridViewTotals {
    pub values: Vec<MetricValue>,

    /// The row total column totalled down, present when row totals are
    /// shown too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<MetricValue>,
}

/// Complete renderable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    /// Full header row: dimensions, then slot labels, then the total column.
    pub headers: Vec<String>,

    pub dimensions: Vec<String>,

    pub slot_labels: Vec<String>,

    pub rows: Vec<GridViewRow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<GridViewTotals>,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Concatenates header groups into a single ordered header row.
pub fn header_row(groups: &[&[String]]) -> Vec<String> {
    groups.iter().flat_map(|g| g.iter().cloned()).collect()
}

fn total_value(total: f64) -> MetricValue {
    MetricValue::text(format_float(total))
}

impl GridView {
    pub fn from_grid(grid: &DenseGrid, totals: &TotalsConfig) -> Self {
        let dimensions = grid.dimensions().to_vec();
        let slot_labels = grid.slot_labels().to_vec();

        let total_header: Vec<String> = totals.row.map(|_| totals.label.clone()).into_iter().collect();
        let headers = header_row(&[dimensions.as_slice(), slot_labels.as_slice(), total_header.as_slice()]);

        let rows = grid
            .rows()
            .map(|(key, cell)| {
                // Labels come back through the codec, exactly as a caller
                // holding only the string key would see them.
                let decoded = LatticeKey::decode(&key.encode());
                GridViewRow {
                    key: key.encode(),
                    labels: dimensions
                        .iter()
                        .map(|d| decoded.value(d).unwrap_or_default().to_string())
                        .collect(),
                    values: cell.values().cloned().collect(),
                    total: totals.row.map(|mode| total_value(row_total(cell, mode))),
                }
            })
            .collect();

        let column = totals.column.map(|mode| {
            let sums = column_totals(grid, mode);
            GridViewTotals {
                total: totals.row.map(|row_mode| total_value(grand_total(grid, row_mode, mode))),
                values: sums.into_iter().map(total_value).collect(),
            }
        });

        GridView {
            headers,
            dimensions,
            slot_labels,
            rows,
            totals: column,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LatticeError::Render(e.to_string()))
    }
}
