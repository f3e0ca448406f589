//! Per-school stop-to-stop travel time matrix.
//!
//! Headerless and square, one row and column per stop in tier-table order.
//! Cells hold a `(distance, seconds)` pair; the second component is the
//! travel time. Bare numbers are read as seconds.
//!
//! ```csv
//! "(0, 0)","(1830, 240)"
//! "(1790, 232)","(0, 0)"
//! ```

use std::io::Read;
use std::path::Path;

use crate::error::{PlannerError, PlannerResult};

/// Load a school's travel time matrix in seconds
pub fn load_time_matrix(path: &Path) -> PlannerResult<Vec<Vec<u64>>> {
    let file = std::fs::File::open(path)?;
    load_time_matrix_reader(file).map_err(|err| match err {
        PlannerError::Configuration(message) => {
            PlannerError::Configuration(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

/// Like [`load_time_matrix`] but accepts any `Read` source.
pub fn load_time_matrix_reader<R: Read>(reader: R) -> PlannerResult<Vec<Vec<u64>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut matrix = Vec::new();
    for (row_index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col_index, cell)| {
                parse_cell(cell).ok_or_else(|| {
                    PlannerError::configuration(format!(
                        "cell ({}, {}) '{}' is not a travel time",
                        row_index, col_index, cell
                    ))
                })
            })
            .collect::<PlannerResult<Vec<u64>>>()?;
        matrix.push(row);
    }

    let size = matrix.len();
    if size == 0 {
        return Err(PlannerError::configuration("distance matrix is empty"));
    }
    if let Some((index, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != size) {
        return Err(PlannerError::configuration(format!(
            "distance matrix is not square: row {} has {} columns, expected {}",
            index,
            row.len(),
            size
        )));
    }

    Ok(matrix)
}

/// Travel seconds from a `(distance, seconds)` cell or a bare number
fn parse_cell(cell: &str) -> Option<u64> {
    let inner = cell.trim().trim_start_matches('(').trim_end_matches(')');
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let seconds = match parts.as_slice() {
        [value] => *value,
        [_, value, ..] => *value,
        [] => return None,
    };
    let seconds: f64 = seconds.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds as u64)
}
