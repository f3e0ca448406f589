//! Bus stop types

use serde::{Deserialize, Serialize};

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One physical pickup stop for one school in one tier
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// School code the riders belong to
    pub school: String,
    /// Stop label as it appears in the source table
    pub label: String,
    pub coordinates: Coordinates,
    /// Number of riders boarding here
    pub riders: u32,
    /// Travel time between the school and this stop in seconds
    pub time_to_school: u64,
}

/// Stops of a single school, in table order
pub fn stops_for_school<'a>(stops: &'a [Stop], school: &str) -> Vec<&'a Stop> {
    stops.iter().filter(|s| s.school == school).collect()
}
