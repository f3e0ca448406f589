//! Per-school routing problem construction
//!
//! Node layout of the augmented matrix:
//! - `0` is the school (depot), every vehicle starts here
//! - `1..=n` are the school's stops in table order
//! - `n + 1` is a zero-cost sink where every vehicle ends

use chrono::NaiveTime;

use crate::error::{PlannerError, PlannerResult};
use crate::types::Stop;

/// Boarding time credited to a stop based on its rider count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTime {
    pub base_seconds: u64,
    /// Stops with at most this many riders take only the base time
    pub rider_threshold: u32,
    pub seconds_per_rider: u64,
}

impl ServiceTime {
    pub fn penalty(&self, riders: u32) -> u64 {
        if riders <= self.rider_threshold {
            self.base_seconds
        } else {
            self.base_seconds + u64::from(riders - self.rider_threshold) * self.seconds_per_rider
        }
    }
}

/// Fleet-side parameters shared by every school of a tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemParams {
    pub vehicle_count: usize,
    pub vehicle_capacity: u32,
    pub max_route_seconds: u64,
    pub shift_start: NaiveTime,
}

/// Input handed to a route solver for one school
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    pub school: String,
    /// Stops behind nodes `1..=n`
    pub stops: Vec<Stop>,
    /// Travel plus destination service time in seconds
    pub time_matrix: Vec<Vec<u64>>,
    /// Negated rider counts per node; depot and sink are zero
    pub demands: Vec<i64>,
    pub vehicle_count: usize,
    pub vehicle_capacity: u32,
    pub max_route_seconds: u64,
    pub starts: Vec<usize>,
    pub ends: Vec<usize>,
    pub shift_start: NaiveTime,
}

impl RoutingProblem {
    pub fn size(&self) -> usize {
        self.time_matrix.len()
    }

    pub fn depot(&self) -> usize {
        0
    }

    pub fn sink(&self) -> usize {
        self.size() - 1
    }

    pub fn stop_nodes(&self) -> std::ops::Range<usize> {
        1..self.sink()
    }

    /// Stop behind a node, `None` for depot and sink
    pub fn stop(&self, node: usize) -> Option<&Stop> {
        if node == self.depot() || node >= self.sink() {
            return None;
        }
        self.stops.get(node - 1)
    }

    /// Riders boarding at a node
    pub fn riders(&self, node: usize) -> u32 {
        self.demands.get(node).map(|d| (-d).max(0) as u32).unwrap_or(0)
    }

    pub fn cost(&self, from: usize, to: usize) -> u64 {
        self.time_matrix[from][to]
    }

    /// Total riders over all stops
    pub fn total_riders(&self) -> u64 {
        self.stop_nodes().map(|node| u64::from(self.riders(node))).sum()
    }
}

/// Build the augmented routing problem for one school.
///
/// `tier_stops` is the whole tier table; only rows of `school` are used.
/// `stop_times` is the school's stop-to-stop travel time matrix, in the same
/// order as its rows in the tier table.
pub fn build_routing_problem(
    school: &str,
    tier_stops: &[Stop],
    stop_times: &[Vec<u64>],
    params: &ProblemParams,
    service: &ServiceTime,
) -> PlannerResult<RoutingProblem> {
    let stops: Vec<Stop> = tier_stops
        .iter()
        .filter(|s| s.school == school)
        .cloned()
        .collect();

    let n = stops.len();
    if n == 0 {
        return Err(PlannerError::configuration(format!(
            "school {} has no stops",
            school
        )));
    }
    if stop_times.len() != n || stop_times.iter().any(|row| row.len() != n) {
        return Err(PlannerError::configuration(format!(
            "distance matrix for {} must be {}x{} to match its stops",
            school, n, n
        )));
    }

    let size = n + 2;
    let sink = size - 1;
    let mut matrix = vec![vec![0u64; size]; size];

    for (i, stop) in stops.iter().enumerate() {
        matrix[0][i + 1] = stop.time_to_school;
        matrix[i + 1][0] = stop.time_to_school;
        for (j, &time) in stop_times[i].iter().enumerate() {
            matrix[i + 1][j + 1] = time;
        }
    }

    // Dwell time is charged on arrival at the destination stop
    for (j, stop) in stops.iter().enumerate() {
        let penalty = service.penalty(stop.riders);
        let to = j + 1;
        for (from, costs) in matrix.iter_mut().take(sink).enumerate() {
            if from != to {
                costs[to] += penalty;
            }
        }
    }

    let mut demands = Vec::with_capacity(size);
    demands.push(0);
    demands.extend(stops.iter().map(|s| -i64::from(s.riders)));
    demands.push(0);

    Ok(RoutingProblem {
        school: school.to_string(),
        stops,
        time_matrix: matrix,
        demands,
        vehicle_count: params.vehicle_count,
        vehicle_capacity: params.vehicle_capacity,
        max_route_seconds: params.max_route_seconds,
        starts: vec![0; params.vehicle_count],
        ends: vec![sink; params.vehicle_count],
        shift_start: params.shift_start,
    })
}
