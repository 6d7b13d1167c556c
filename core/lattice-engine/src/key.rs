//! FILENAME: core/lattice-engine/src/key.rs
//! Lattice keys and their canonical string form.
//!
//! A `LatticeKey` is the structured identity of one grid row: the sorted list
//! of (dimension, value) pairs it stands for. The string form
//! `name:value^name:value^` only exists at the edges, for the renderer and
//! for callers holding keys from an earlier response.
//!
//! Values containing `:` or `^` cannot be decoded unambiguously. The engine
//! does not guard against that; data is expected to pass through
//! [`check_delimiters`] before it reaches a catalog.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::{LatticeError, Result};

/// Separates a dimension name from its value.
pub const PAIR_DELIMITER: char = ':';

/// Terminates every pair.
pub const SEGMENT_DELIMITER: char = '^';

// ============================================================================
// DIMENSION VALUE
// ============================================================================

/// One (dimension, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DimensionValue {
    pub dimension: String,
    pub value: String,
}

impl DimensionValue {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        DimensionValue {
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// LATTICE KEY
// ============================================================================

/// Pairs sorted by dimension name. Reports rarely group on more than four
/// dimensions, so the pairs live inline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LatticeKey {
    pairs: SmallVec<[DimensionValue; 4]>,
}

impl LatticeKey {
    /// Builds a key from pairs in any order.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = DimensionValue>,
    {
        let mut pairs: SmallVec<[DimensionValue; 4]> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.dimension.cmp(&b.dimension));
        LatticeKey { pairs }
    }

    /// Builds a key from pairs that are already sorted by dimension name.
    pub(crate) fn from_sorted(pairs: SmallVec<[DimensionValue; 4]>) -> Self {
        debug_assert!(pairs.windows(2).all(|w| w[0].dimension <= w[1].dimension));
        LatticeKey { pairs }
    }

    pub fn pairs(&self) -> &[DimensionValue] {
        &self.pairs
    }

    /// The value this key holds for `dimension`.
    pub fn value(&self, dimension: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.dimension == dimension)
            .map(|p| p.value.as_str())
    }

    /// Canonical string form.
    pub fn encode(&self) -> String {
        encode(&self.pairs)
    }

    /// Parses a canonical string back into a key.
    pub fn decode(key: &str) -> Self {
        LatticeKey::new(decode(key))
    }
}

impl fmt::Display for LatticeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for LatticeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for LatticeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(LatticeKey::decode(&key))
    }
}

// ============================================================================
// CODEC
// ============================================================================

/// Encodes pairs as `name:value^` per pair, sorted by dimension name, so any
/// two set-equal inputs produce the same string.
pub fn encode(pairs: &[DimensionValue]) -> String {
    let mut sorted: Vec<&DimensionValue> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.dimension.cmp(&b.dimension));

    let mut key = String::new();
    for pair in sorted {
        key.push_str(&pair.dimension);
        key.push(PAIR_DELIMITER);
        key.push_str(&pair.value);
        key.push(SEGMENT_DELIMITER);
    }
    key
}

/// Splits a key on `^`, then each segment on its first `:`. A segment with no
/// `:` decodes to an empty value.
pub fn decode(key: &str) -> Vec<DimensionValue> {
    key.split(SEGMENT_DELIMITER)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once(PAIR_DELIMITER) {
            Some((dimension, value)) => DimensionValue::new(dimension, value),
            None => DimensionValue::new(segment, ""),
        })
        .collect()
}

/// Rejects a dimension name or value that would collide with the key
/// delimiters. For callers validating data before it is catalogued.
pub fn check_delimiters(dimension: &str, value: &str) -> Result<()> {
    let collides = |s: &str| s.contains(PAIR_DELIMITER) || s.contains(SEGMENT_DELIMITER);
    if collides(dimension) || collides(value) {
        return Err(LatticeError::DelimiterCollision {
            dimension: dimension.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
