//! School locations loader.
//!
//! ```csv
//! longitude,latitude,school,tier,depot_capacity
//! -80.84,35.22,JHS,1,12
//! -80.80,35.25,HMS,2,
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PlannerError, PlannerResult};
use crate::types::{Coordinates, School};

#[derive(Deserialize)]
struct SchoolRecord {
    longitude: f64,
    latitude: f64,
    school: String,
    tier: u8,
    #[serde(default)]
    depot_capacity: Option<u32>,
}

pub fn load_schools(path: &Path) -> PlannerResult<Vec<School>> {
    let file = std::fs::File::open(path)?;
    load_schools_reader(file)
}

/// Like [`load_schools`] but accepts any `Read` source.
pub fn load_schools_reader<R: Read>(reader: R) -> PlannerResult<Vec<School>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut schools = Vec::new();
    for result in csv_reader.deserialize::<SchoolRecord>() {
        let row = result?;
        schools.push(School {
            code: row.school,
            coordinates: Coordinates {
                lat: row.latitude,
                lng: row.longitude,
            },
            tier: row.tier,
            depot_capacity: row.depot_capacity,
        });
    }

    if schools.is_empty() {
        return Err(PlannerError::configuration("school locations table is empty"));
    }
    Ok(schools)
}
