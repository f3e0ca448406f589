//! Adapter to build vrp-pragmatic inputs.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use vrp_pragmatic::format::problem::Matrix;

use crate::services::problem::RoutingProblem;

pub const DEFAULT_PROFILE: &str = "bus";
pub const DEFAULT_VEHICLE_TYPE: &str = "school_bus";

const JOB_PREFIX: &str = "node_";
const VEHICLE_PREFIX: &str = "bus_";

pub fn job_id(node: usize) -> String {
    format!("{}{}", JOB_PREFIX, node)
}

pub fn job_node(job_id: &str) -> Option<usize> {
    job_id.strip_prefix(JOB_PREFIX)?.parse().ok()
}

pub fn vehicle_id(vehicle: usize) -> String {
    format!("{}{}", VEHICLE_PREFIX, vehicle)
}

pub fn vehicle_index(vehicle_id: &str) -> Option<usize> {
    vehicle_id.strip_prefix(VEHICLE_PREFIX)?.parse().ok()
}

/// Build pragmatic problem JSON for one school.
///
/// Service time is already folded into the matrix, so jobs carry no duration.
/// Every vehicle starts at the school and ends at the sink node; the shift
/// window length is the route ceiling.
pub fn build_pragmatic_problem(problem: &RoutingProblem, date: NaiveDate) -> Value {
    let jobs: Vec<Value> = problem
        .stop_nodes()
        .map(|node| {
            json!({
                "id": job_id(node),
                "pickups": [{
                    "places": [{
                        "location": { "index": node },
                        "duration": 0
                    }],
                    "demand": [problem.riders(node)]
                }]
            })
        })
        .collect();

    let vehicle_ids: Vec<String> = (0..problem.vehicle_count).map(vehicle_id).collect();
    let start = NaiveDateTime::new(date, problem.shift_start);
    let end = start + Duration::seconds(problem.max_route_seconds as i64);

    json!({
        "plan": {
            "jobs": jobs
        },
        "fleet": {
            "vehicles": [{
                "typeId": DEFAULT_VEHICLE_TYPE,
                "vehicleIds": vehicle_ids,
                "profile": { "matrix": DEFAULT_PROFILE },
                "costs": {
                    "fixed": 0.0,
                    "distance": 0.0,
                    "time": 1.0
                },
                "shifts": [{
                    "start": {
                        "earliest": format_rfc3339(start),
                        "location": { "index": problem.depot() }
                    },
                    "end": {
                        "latest": format_rfc3339(end),
                        "location": { "index": problem.sink() }
                    }
                }],
                "capacity": [problem.vehicle_capacity]
            }],
            "profiles": [{
                "name": DEFAULT_PROFILE
            }]
        }
    })
}

/// Build pragmatic routing matrix from the augmented time matrix.
///
/// Distances mirror the times; the vehicle costs only price time.
pub fn build_pragmatic_matrix(problem: &RoutingProblem, profile: &str) -> Matrix {
    let size = problem.size();
    let mut travel_times = Vec::with_capacity(size * size);

    for i in 0..size {
        for j in 0..size {
            travel_times.push(problem.cost(i, j) as i64);
        }
    }

    Matrix {
        profile: Some(profile.to_string()),
        timestamp: None,
        distances: travel_times.clone(),
        travel_times,
        error_codes: None,
    }
}

fn format_rfc3339(naive: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
