//! FILENAME: core/lattice-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LatticeError {
    /// A sparse row's dimension combination was never registered in the
    /// catalog. The catalog and the rows came from inconsistent data.
    #[error("no lattice cell for key [{key}]")]
    MissingLatticeCell { key: String },

    #[error("interval [{interval}] is not in the known sequence (row key [{key}])")]
    MissingIntervalSlot { key: String, interval: String },

    #[error("record is missing field: {0}")]
    MissingField(String),

    #[error("dimension not tracked by the catalog: {0}")]
    UnknownDimension(String),

    #[error("report needs at least one grouping dimension")]
    NoDimensions,

    #[error("field used for more than one role in the report: {0}")]
    ConflictingField(String),

    #[error("invalid report definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),

    #[error("failed to render grid: {0}")]
    Render(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("value [{value}] for dimension [{dimension}] contains a key delimiter")]
    DelimiterCollision { dimension: String, value: String },
}

pub type Result<T> = std::result::Result<T, LatticeError>;
