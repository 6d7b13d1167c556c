//! FILENAME: core/lattice-engine/src/totals.rs
//! Row and column totals over a trimmed grid.
//!
//! Only slots with a numeric reading count (ints, floats, numeric text).
//! Averages divide by the number of strictly positive entries, so the zero
//! sentinels of untouched slots do not drag a row or column down.

use crate::definition::TotalMode;
use crate::grid::DenseGrid;
use crate::key::LatticeKey;
use crate::lattice::Cell;

fn sum_and_positive<I>(numbers: I) -> (f64, usize)
where
    I: IntoIterator<Item = f64>,
{
    numbers.into_iter().fold((0.0, 0), |(sum, positive), n| {
        (sum + n, if n > 0.0 { positive + 1 } else { positive })
    })
}

/// Total across one row under `mode`. A row average is only taken when the
/// summed total is positive.
pub fn row_total_of<I>(numbers: I, mode: TotalMode) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, positive) = sum_and_positive(numbers);
    match mode {
        TotalMode::Sum => sum,
        TotalMode::Average if sum > 0.0 && positive > 0 => sum / positive as f64,
        TotalMode::Average => sum,
    }
}

/// Total down one column under `mode`. A column average divides whenever the
/// column has a positive entry, whatever the sign of the sum.
pub fn column_total_of<I>(numbers: I, mode: TotalMode) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, positive) = sum_and_positive(numbers);
    match mode {
        TotalMode::Sum => sum,
        TotalMode::Average if positive > 0 => sum / positive as f64,
        TotalMode::Average => sum,
    }
}

/// Total across the slots of one cell.
pub fn row_total(cell: &Cell, mode: TotalMode) -> f64 {
    row_total_of(cell.values().filter_map(|v| v.as_f64()), mode)
}

/// Total for every row of the grid, in row order.
pub fn row_totals(grid: &DenseGrid, mode: TotalMode) -> Vec<(LatticeKey, f64)> {
    grid.rows()
        .map(|(key, cell)| (key.clone(), row_total(cell, mode)))
        .collect()
}

/// Total down each slot column, in slot label order.
pub fn column_totals(grid: &DenseGrid, mode: TotalMode) -> Vec<f64> {
    (0..grid.slot_labels().len())
        .map(|i| {
            let column = grid
                .rows()
                .filter_map(|(_, cell)| cell.slot(i).and_then(|s| s.value().as_f64()));
            column_total_of(column, mode)
        })
        .collect()
}

/// The corner of the totals row: the row totals (already under `row_mode`)
/// totalled down like any other column, under `column_mode`.
pub fn grand_total(grid: &DenseGrid, row_mode: TotalMode, column_mode: TotalMode) -> f64 {
    column_total_of(grid.rows().map(|(_, cell)| row_total(cell, row_mode)), column_mode)
}
