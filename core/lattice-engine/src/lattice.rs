//! FILENAME: core/lattice-engine/src/lattice.rs
//! Lattice - the skeleton of every row a report could have.
//!
//! The lattice is the cartesian product of the value sets of the report's key
//! dimensions, materialized up front with one all-default cell per key. Its
//! size is `∏ |values(dimension)|` no matter how sparse the real data is, so
//! callers must not group on several high-cardinality dimensions at once.

use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use engine::logging::{log_debug, log_warn};
use engine::MetricValue;

use crate::catalog::DimensionCatalog;
use crate::definition::{Orientation, ReportDefinition, WritePolicy};
use crate::error::{LatticeError, Result};
use crate::key::{DimensionValue, LatticeKey};

// ============================================================================
// CELLS
// ============================================================================

/// One value position inside a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    value: MetricValue,
    touched: bool,
}

impl Slot {
    pub fn new(default: MetricValue) -> Self {
        Slot {
            value: default,
            touched: false,
        }
    }

    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    /// Whether any sparse row has written to this slot.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Applies one incoming value. The first write to a slot replaces the
    /// sentinel whatever the policy: the sentinel is a placeholder, not a
    /// real zero.
    pub fn write(&mut self, incoming: MetricValue, policy: WritePolicy) {
        self.value = match (self.touched, policy) {
            (true, WritePolicy::Accumulate) => self.value.add(&incoming),
            _ => incoming,
        };
        self.touched = true;
    }
}

/// Accumulator for one lattice key. Wide cells carry one slot per interval,
/// deep cells exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    slots: Vec<Slot>,
}

impl Cell {
    pub fn new(slot_count: usize, default: &MetricValue) -> Self {
        Cell {
            slots: vec![Slot::new(default.clone()); slot_count],
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    pub fn values(&self) -> impl Iterator<Item = &MetricValue> {
        self.slots.iter().map(Slot::value)
    }

    /// True once any slot has been written.
    pub fn is_touched(&self) -> bool {
        self.slots.iter().any(Slot::is_touched)
    }

    pub fn touched_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_touched()).count()
    }
}

// ============================================================================
// LATTICE
// ============================================================================

/// The materialized skeleton: keys in lattice order, each with its cell.
#[derive(Debug, Clone)]
pub struct Lattice {
    dimensions: Vec<String>,
    entries: Vec<(LatticeKey, Cell)>,
    index: FxHashMap<LatticeKey, usize>,
}

impl Lattice {
    /// Key dimensions, sorted.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &LatticeKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn get(&self, key: &LatticeKey) -> Option<&Cell> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &LatticeKey) -> Option<&mut Cell> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Consumes the lattice, yielding entries in lattice order.
    pub fn into_entries(self) -> Vec<(LatticeKey, Cell)> {
        self.entries
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// One axis of the product: a dimension name and its values in order.
#[derive(Debug, Clone)]
struct Axis<'a> {
    name: String,
    values: &'a [String],
}

/// Computes the cartesian product of the catalog's value sets for a chosen
/// subset of dimensions.
#[derive(Debug, Clone)]
pub struct LatticeBuilder<'a> {
    catalog: &'a DimensionCatalog,
    axes: Vec<Axis<'a>>,
}

impl<'a> LatticeBuilder<'a> {
    /// Uses `dimensions` (any order, repeats ignored) as the lattice axes.
    /// Every dimension must be tracked by the catalog.
    pub fn new(catalog: &'a DimensionCatalog, dimensions: &[String]) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(LatticeError::NoDimensions);
        }

        let mut names: Vec<&String> = dimensions.iter().collect();
        names.sort();
        names.dedup();

        let axes = names
            .into_iter()
            .map(|name| {
                catalog
                    .values(name)
                    .map(|values| Axis {
                        name: name.clone(),
                        values,
                    })
                    .ok_or_else(|| LatticeError::UnknownDimension(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LatticeBuilder { catalog, axes })
    }

    /// Builder for a report: its grouping dimensions, plus the interval
    /// sequence as an extra axis in deep orientation.
    pub fn for_definition(catalog: &'a DimensionCatalog, definition: &ReportDefinition) -> Result<Self> {
        let builder = LatticeBuilder::new(catalog, &definition.grouping_dimensions())?;
        Ok(match definition.orientation {
            Orientation::Wide => builder,
            Orientation::Deep => builder.with_intervals_as(&definition.interval_field),
        })
    }

    /// Adds the catalog's interval sequence as an axis named `field`.
    pub fn with_intervals_as(mut self, field: &str) -> Self {
        let axis = Axis {
            name: field.to_string(),
            values: self.catalog.intervals(),
        };
        let pos = self
            .axes
            .iter()
            .position(|a| a.name.as_str() > field)
            .unwrap_or(self.axes.len());
        self.axes.insert(pos, axis);
        self
    }

    /// Axis names in key order.
    pub fn dimensions(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.name.clone()).collect()
    }

    /// Number of keys the product will hold.
    pub fn cardinality(&self) -> usize {
        self.axes
            .iter()
            .fold(1usize, |acc, axis| acc.saturating_mul(axis.values.len()))
    }

    /// Every key of the product, odometer order (last axis varies fastest).
    pub fn keys(&self) -> Vec<LatticeKey> {
        let size = self.cardinality();
        if size == 0 {
            return Vec::new();
        }

        let mut keys = Vec::with_capacity(size);
        let mut at = vec![0usize; self.axes.len()];

        loop {
            let pairs: SmallVec<[DimensionValue; 4]> = self
                .axes
                .iter()
                .zip(&at)
                .map(|(axis, &i)| DimensionValue::new(axis.name.as_str(), axis.values[i].as_str()))
                .collect();
            keys.push(LatticeKey::from_sorted(pairs));

            // Advance the odometer; done once the first axis rolls over.
            let mut axis = self.axes.len();
            loop {
                if axis == 0 {
                    return keys;
                }
                axis -= 1;
                at[axis] += 1;
                if at[axis] < self.axes[axis].values.len() {
                    break;
                }
                at[axis] = 0;
            }
        }
    }

    /// Materializes the skeleton: one cell of `slot_count` default slots per key.
    pub fn build(&self, slot_count: usize, default: &MetricValue) -> Lattice {
        let dimensions = self.dimensions();
        let size = self.cardinality();

        if size == 0 {
            let empty: Vec<&str> = self
                .axes
                .iter()
                .filter(|a| a.values.is_empty())
                .map(|a| a.name.as_str())
                .collect();
            log_warn!("LATTICE", "no combinations: dimensions {:?} have no values", empty);
        } else {
            log_debug!(
                "LATTICE",
                "building {} cells over {:?} ({} slots each)",
                size,
                dimensions,
                slot_count
            );
        }

        let keys = self.keys();
        let mut index = FxHashMap::default();
        index.reserve(keys.len());
        let mut entries = Vec::with_capacity(keys.len());

        for (i, key) in keys.into_iter().enumerate() {
            index.insert(key.clone(), i);
            entries.push((key, Cell::new(slot_count, default)));
        }

        Lattice {
            dimensions,
            entries,
            index,
        }
    }
}
