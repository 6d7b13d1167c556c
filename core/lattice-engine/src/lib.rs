//! FILENAME: core/lattice-engine/src/lib.rs
//! Report densification for the cost dashboards.
//!
//! A GROUP BY over the cost store only returns combinations that have data.
//! Charts and tables need every series present and aligned on the same
//! interval axis, so this crate fills the gaps in, then drops the series that
//! stayed empty. It depends on `engine` for the shared MetricValue and the
//! logging macros.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the report IS)
//! - `catalog`, `key`, `intervals`: Inputs and addressing
//! - `lattice`: The all-default skeleton (HOW we store)
//! - `engine`: Accumulation and trimming (HOW we calculate)
//! - `grid`, `totals`, `view`: Results (WHAT we display)

pub mod catalog;
pub mod definition;
pub mod engine;
pub mod error;
pub mod grid;
pub mod intervals;
pub mod key;
pub mod lattice;
pub mod totals;
pub mod view;

pub use crate::catalog::{DimensionCatalog, SparseRow};
pub use crate::definition::*;
pub use crate::engine::{densify, trim, GridAccumulator};
pub use crate::error::{LatticeError, Result};
pub use crate::grid::DenseGrid;
pub use crate::intervals::{interval_labels, labels_between, parse_date, Granularity};
pub use crate::key::{DimensionValue, LatticeKey};
pub use crate::lattice::{Cell, Lattice, LatticeBuilder, Slot};
pub use crate::totals::{column_total_of, column_totals, grand_total, row_total, row_total_of, row_totals};
pub use crate::view::{GridView, GridViewRow, GridViewTotals};

pub use ::engine::MetricValue;
