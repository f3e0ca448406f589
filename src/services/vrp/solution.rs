//! Solver output and route materialization
//!
//! Converts per-vehicle node sequences into school routes.

use tracing::debug;

use crate::services::problem::RoutingProblem;
use crate::types::{Route, RouteVisit};

/// Node sequence one vehicle drives, depot and sink excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedRoute {
    pub vehicle: usize,
    pub nodes: Vec<usize>,
}

impl SolvedRoute {
    /// Arc cost of depot -> nodes -> sink
    pub fn time(&self, problem: &RoutingProblem) -> u64 {
        let mut previous = problem.depot();
        let mut total = 0;
        for &node in &self.nodes {
            total += problem.cost(previous, node);
            previous = node;
        }
        total + problem.cost(previous, problem.sink())
    }

    /// Riders picked up along the route
    pub fn load(&self, problem: &RoutingProblem) -> u32 {
        self.nodes.iter().map(|&node| problem.riders(node)).sum()
    }
}

/// Turn solver output into routes, dropping vehicles that never left the depot.
///
/// Routes are indexed in vehicle order.
pub fn materialize_routes(problem: &RoutingProblem, solved: &[SolvedRoute]) -> Vec<Route> {
    let mut ordered: Vec<&SolvedRoute> = solved.iter().collect();
    ordered.sort_by_key(|r| r.vehicle);

    let mut routes = Vec::new();
    for solved_route in ordered {
        let duration = solved_route.time(problem);
        if duration == 0 {
            debug!(
                "{}: vehicle {} unused, no bus needed",
                problem.school, solved_route.vehicle
            );
            continue;
        }

        let mut cumulative_load = 0;
        let visits = solved_route
            .nodes
            .iter()
            .filter_map(|&node| {
                let stop = problem.stop(node)?;
                cumulative_load += stop.riders;
                Some(RouteVisit {
                    label: stop.label.clone(),
                    coordinates: stop.coordinates,
                    riders: stop.riders,
                    cumulative_load,
                })
            })
            .collect();

        routes.push(Route {
            school: problem.school.clone(),
            index: routes.len(),
            visits,
            duration,
            load: solved_route.load(problem),
        });
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::problem::{build_routing_problem, ProblemParams, ServiceTime};
    use crate::types::{Coordinates, Stop};
    use chrono::NaiveTime;

    fn problem() -> RoutingProblem {
        let stops = vec![
            Stop {
                school: "JHS".to_string(),
                label: "a".to_string(),
                coordinates: Coordinates { lat: 35.0, lng: -80.0 },
                riders: 2,
                time_to_school: 100,
            },
            Stop {
                school: "JHS".to_string(),
                label: "b".to_string(),
                coordinates: Coordinates { lat: 35.1, lng: -80.1 },
                riders: 3,
                time_to_school: 150,
            },
        ];
        build_routing_problem(
            "JHS",
            &stops,
            &[vec![0, 30], vec![30, 0]],
            &ProblemParams {
                vehicle_count: 3,
                vehicle_capacity: 54,
                max_route_seconds: 2700,
                shift_start: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            },
            &ServiceTime {
                base_seconds: 60,
                rider_threshold: 5,
                seconds_per_rider: 10,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_route_time_sums_arcs() {
        let problem = problem();
        let route = SolvedRoute { vehicle: 0, nodes: vec![1, 2] };
        // depot->a 160, a->b 90, b->sink 0
        assert_eq!(route.time(&problem), 250);
        assert_eq!(route.load(&problem), 5);
    }

    #[test]
    fn test_unused_vehicles_dropped() {
        let problem = problem();
        let solved = vec![
            SolvedRoute { vehicle: 0, nodes: vec![] },
            SolvedRoute { vehicle: 1, nodes: vec![2, 1] },
            SolvedRoute { vehicle: 2, nodes: vec![] },
        ];
        let routes = materialize_routes(&problem, &solved);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].index, 0);
        assert_eq!(routes[0].load, 5);
        assert_eq!(routes[0].terminal().map(|v| v.label.as_str()), Some("a"));
        assert_eq!(routes[0].visits[0].cumulative_load, 3);
        assert_eq!(routes[0].visits[1].cumulative_load, 5);
    }

    #[test]
    fn test_routes_indexed_in_vehicle_order() {
        let problem = problem();
        let solved = vec![
            SolvedRoute { vehicle: 2, nodes: vec![2] },
            SolvedRoute { vehicle: 0, nodes: vec![1] },
        ];
        let routes = materialize_routes(&problem, &solved);
        assert_eq!(routes[0].visits[0].label, "a");
        assert_eq!(routes[1].visits[0].label, "b");
        assert_eq!(routes[1].index, 1);
    }
}
