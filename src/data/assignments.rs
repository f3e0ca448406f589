//! Final bus assignment table.
//!
//! ```csv
//! bus,school,route,duration,load
//! 0,JHS,2,1930,41
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PlannerResult;

/// One leg of one bus's chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub bus: usize,
    pub school: String,
    pub route: usize,
    pub duration: u64,
    pub load: u32,
}

pub fn write_assignments(path: &Path, rows: &[AssignmentRow]) -> PlannerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_assignments_writer(file, rows)
}

pub fn write_assignments_writer<W: Write>(writer: W, rows: &[AssignmentRow]) -> PlannerResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(["bus", "school", "route", "duration", "load"])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
