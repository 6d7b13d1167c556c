//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Shared types for the reporting engines.
//! CONTEXT: Holds the metric value every grid slot carries and the logging
//! facade the engine crates write through. Re-exports public types for use by
//! other crates.

pub mod logging;
pub mod value;

// Re-export commonly used types at the crate root
pub use value::{format_float, MetricValue};
