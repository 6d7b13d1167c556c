//! FILENAME: tests/common/mod.rs
//! Fixtures for lattice-engine integration tests.

#![allow(dead_code)]

use lattice_engine::{DimensionCatalog, SparseRow};

/// Monthly costs per unit and environment, shaped like the rows a
/// `GROUP BY unit, environment, date` returns.
pub struct CostFixture;

impl CostFixture {
    pub fn intervals() -> Vec<String> {
        ["2024-01", "2024-02", "2024-03"].map(String::from).to_vec()
    }

    pub fn columns() -> Vec<(String, Vec<String>)> {
        vec![
            ("unit".to_string(), vec!["A".to_string(), "B".to_string()]),
            ("environment".to_string(), vec!["development".to_string()]),
        ]
    }

    pub fn catalog() -> DimensionCatalog {
        DimensionCatalog::build(Self::columns(), Self::intervals())
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, &'static str)> {
        vec![
            ("A", "development", "2024-01", "-1.01"),
            ("A", "development", "2024-02", "3.01"),
            ("B", "development", "2024-01", "10.0"),
        ]
    }

    pub fn rows() -> Vec<SparseRow> {
        Self::data()
            .into_iter()
            .map(|(unit, env, date, cost)| cost_row(unit, env, date, cost))
            .collect()
    }
}

/// Two environments, so the unit-only grouping collapses rows together.
pub struct MultiEnvFixture;

impl MultiEnvFixture {
    pub fn catalog() -> DimensionCatalog {
        DimensionCatalog::build(
            vec![
                ("unit".to_string(), vec!["A".to_string(), "B".to_string()]),
                ("environment".to_string(), vec!["dev".to_string(), "prod".to_string()]),
            ],
            ["2024-01", "2024-02"].map(String::from),
        )
    }

    pub fn rows() -> Vec<SparseRow> {
        vec![
            cost_row("A", "dev", "2024-01", "1.5"),
            cost_row("A", "prod", "2024-01", "2.5"),
            cost_row("A", "prod", "2024-02", "4"),
            cost_row("B", "prod", "2024-02", "7.25"),
        ]
    }
}

pub fn cost_row(unit: &str, environment: &str, date: &str, cost: &str) -> SparseRow {
    SparseRow::new()
        .with("unit", unit)
        .with("environment", environment)
        .with("date", date)
        .with("cost", cost)
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
