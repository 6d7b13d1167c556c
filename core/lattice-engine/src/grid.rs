//! FILENAME: core/lattice-engine/src/grid.rs
//! Dense Grid - the trimmed result of one densification run.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use engine::MetricValue;

use crate::definition::Orientation;
use crate::key::LatticeKey;
use crate::lattice::Cell;

/// Every key that received data, with its cell. Keys are complete
/// combinations of `dimensions`; slots line up with `slot_labels`.
///
/// Rows keep lattice order: dimension values in code point order, and in deep
/// orientation the interval axis in the order the catalog lists intervals.
#[derive(Debug, Clone)]
pub struct DenseGrid {
    orientation: Orientation,
    dimensions: Vec<String>,
    slot_labels: Vec<String>,
    intervals: Vec<String>,
    default_value: MetricValue,
    rows: Vec<(LatticeKey, Cell)>,
    index: FxHashMap<LatticeKey, usize>,
}

impl PartialEq for DenseGrid {
    fn eq(&self, other: &Self) -> bool {
        self.orientation == other.orientation
            && self.dimensions == other.dimensions
            && self.slot_labels == other.slot_labels
            && self.intervals == other.intervals
            && self.default_value == other.default_value
            && self.rows == other.rows
    }
}

impl DenseGrid {
    pub(crate) fn new(
        orientation: Orientation,
        dimensions: Vec<String>,
        slot_labels: Vec<String>,
        intervals: Vec<String>,
        default_value: MetricValue,
        rows: Vec<(LatticeKey, Cell)>,
    ) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (key.clone(), i))
            .collect();

        DenseGrid {
            orientation,
            dimensions,
            slot_labels,
            intervals,
            default_value,
            rows,
            index,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Key dimensions, sorted. Includes the interval field in deep orientation.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Column labels for the slots of every cell: the intervals when wide,
    /// the value field when deep.
    pub fn slot_labels(&self) -> &[String] {
        &self.slot_labels
    }

    /// The report's full interval sequence, for column headers.
    pub fn intervals(&self) -> &[String] {
        &self.intervals
    }

    /// The sentinel untouched slots hold.
    pub fn default_value(&self) -> &MetricValue {
        &self.default_value
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in lattice order.
    pub fn rows(&self) -> impl Iterator<Item = (&LatticeKey, &Cell)> {
        self.rows.iter().map(|(key, cell)| (key, cell))
    }

    pub fn get(&self, key: &LatticeKey) -> Option<&Cell> {
        self.index.get(key).map(|&i| &self.rows[i].1)
    }

    /// Looks a row up by its canonical string key.
    pub fn get_encoded(&self, key: &str) -> Option<&Cell> {
        self.get(&LatticeKey::decode(key))
    }

    /// The value in the slot labelled `label` for the row at `key`.
    pub fn value(&self, key: &str, label: &str) -> Option<&MetricValue> {
        let index = self.slot_labels.iter().position(|l| l == label)?;
        self.get_encoded(key)?.slot(index).map(|s| s.value())
    }

    /// A row as `label -> value`, the shape templates index into.
    pub fn labelled(&self, cell: &Cell) -> BTreeMap<String, MetricValue> {
        self.slot_labels
            .iter()
            .cloned()
            .zip(cell.values().cloned())
            .collect()
    }

    pub fn into_rows(self) -> Vec<(LatticeKey, Cell)> {
        self.rows
    }
}
