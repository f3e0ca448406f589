//! Tier stop table loader.
//!
//! ```csv
//! longitude,latitude,school,stop,riders,time_to_school
//! -80.84,35.22,JHS,Oak & 5th,4,310
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PlannerError, PlannerResult};
use crate::types::{Coordinates, Stop};

#[derive(Deserialize)]
struct StopRecord {
    longitude: f64,
    latitude: f64,
    school: String,
    stop: String,
    riders: i64,
    time_to_school: f64,
}

/// Load every stop of one tier
pub fn load_stops(path: &Path) -> PlannerResult<Vec<Stop>> {
    let file = std::fs::File::open(path)?;
    load_stops_reader(file).map_err(|err| match err {
        PlannerError::Configuration(message) => {
            PlannerError::Configuration(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

/// Like [`load_stops`] but accepts any `Read` source.
pub fn load_stops_reader<R: Read>(reader: R) -> PlannerResult<Vec<Stop>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut stops = Vec::new();
    for (line, result) in csv_reader.deserialize::<StopRecord>().enumerate() {
        let row = result?;
        let riders = u32::try_from(row.riders).map_err(|_| {
            PlannerError::configuration(format!(
                "row {}: stop {} has invalid rider count {}",
                line + 1,
                row.stop,
                row.riders
            ))
        })?;
        if row.time_to_school < 0.0 {
            return Err(PlannerError::configuration(format!(
                "row {}: stop {} has negative travel time",
                line + 1,
                row.stop
            )));
        }
        stops.push(Stop {
            school: row.school,
            label: row.stop,
            coordinates: Coordinates {
                lat: row.latitude,
                lng: row.longitude,
            },
            riders,
            time_to_school: row.time_to_school as u64,
        });
    }

    if stops.is_empty() {
        return Err(PlannerError::configuration("stop table is empty"));
    }
    Ok(stops)
}
