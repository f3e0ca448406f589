//! Deterministic nearest-neighbour route construction

use super::{RouteSolver, SolvedRoute};
use crate::error::{PlannerError, PlannerResult};
use crate::services::problem::RoutingProblem;

/// Path-cheapest-arc construction.
///
/// Opens one vehicle at a time and keeps extending it with the cheapest
/// unvisited stop that still fits the seat count and the route ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborSolver;

impl NearestNeighborSolver {
    pub fn new() -> Self {
        Self
    }

    /// Cheapest stop reachable from `current`; ties go to the lower node
    fn next_stop(
        problem: &RoutingProblem,
        visited: &[bool],
        current: usize,
        time: u64,
        load: u32,
    ) -> Option<usize> {
        let mut best_next = None;
        let mut best_cost = u64::MAX;

        for node in problem.stop_nodes() {
            if visited[node] {
                continue;
            }
            if load + problem.riders(node) > problem.vehicle_capacity {
                continue;
            }
            let cost = problem.cost(current, node);
            if time + cost + problem.cost(node, problem.sink()) > problem.max_route_seconds {
                continue;
            }
            if cost < best_cost {
                best_cost = cost;
                best_next = Some(node);
            }
        }

        best_next
    }
}

impl RouteSolver for NearestNeighborSolver {
    fn name(&self) -> &str {
        "nearest-neighbor"
    }

    fn solve(&self, problem: &RoutingProblem) -> PlannerResult<Vec<SolvedRoute>> {
        let mut visited = vec![false; problem.size()];
        let mut remaining = problem.stop_nodes().len();
        let mut routes = Vec::new();

        for vehicle in 0..problem.vehicle_count {
            if remaining == 0 {
                break;
            }

            let mut nodes = Vec::new();
            let mut current = problem.depot();
            let mut time = 0;
            let mut load = 0;

            while let Some(next) = Self::next_stop(problem, &visited, current, time, load) {
                visited[next] = true;
                remaining -= 1;
                time += problem.cost(current, next);
                load += problem.riders(next);
                nodes.push(next);
                current = next;
            }

            if nodes.is_empty() {
                // Nothing left fits an empty bus, more vehicles will not help
                break;
            }
            routes.push(SolvedRoute { vehicle, nodes });
        }

        if remaining > 0 {
            return Err(PlannerError::infeasible(
                &problem.school,
                format!(
                    "{} of {} stops do not fit {} buses of {} seats within {}s",
                    remaining,
                    problem.stop_nodes().len(),
                    problem.vehicle_count,
                    problem.vehicle_capacity,
                    problem.max_route_seconds
                ),
            ));
        }

        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::problem::{build_routing_problem, ProblemParams, ServiceTime};
    use crate::types::{Coordinates, Stop};
    use chrono::NaiveTime;

    fn stop(label: &str, riders: u32, time_to_school: u64) -> Stop {
        Stop {
            school: "JHS".to_string(),
            label: label.to_string(),
            coordinates: Coordinates { lat: 35.0, lng: -80.0 },
            riders,
            time_to_school,
        }
    }

    fn problem(
        stops: Vec<Stop>,
        times: Vec<Vec<u64>>,
        vehicles: usize,
        capacity: u32,
        max_route_seconds: u64,
    ) -> RoutingProblem {
        build_routing_problem(
            "JHS",
            &stops,
            &times,
            &ProblemParams {
                vehicle_count: vehicles,
                vehicle_capacity: capacity,
                max_route_seconds,
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
    fn test_two_small_stops_share_one_bus() {
        let problem = problem(
            vec![stop("a", 2, 300), stop("b", 2, 360)],
            vec![vec![0, 120], vec![120, 0]],
            3,
            4,
            2700,
        );
        let routes = NearestNeighborSolver::new().solve(&problem).unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].vehicle, 0);
        assert_eq!(routes[0].nodes, vec![1, 2]);
    }

    #[test]
    fn test_capacity_opens_second_bus() {
        let problem = problem(
            vec![stop("a", 3, 300), stop("b", 3, 360)],
            vec![vec![0, 120], vec![120, 0]],
            3,
            4,
            2700,
        );
        let routes = NearestNeighborSolver::new().solve(&problem).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].nodes, vec![1]);
        assert_eq!(routes[1].vehicle, 1);
        assert_eq!(routes[1].nodes, vec![2]);
    }

    #[test]
    fn test_picks_cheapest_arc_first() {
        let problem = problem(
            vec![stop("far", 1, 900), stop("near", 1, 100), stop("mid", 1, 400)],
            vec![vec![0, 800, 300], vec![800, 0, 300], vec![300, 300, 0]],
            1,
            54,
            2700,
        );
        let routes = NearestNeighborSolver::new().solve(&problem).unwrap();
        assert_eq!(routes[0].nodes, vec![2, 3, 1]);
    }

    #[test]
    fn test_time_ceiling_splits_routes() {
        let problem = problem(
            vec![stop("a", 1, 500), stop("b", 1, 500)],
            vec![vec![0, 500], vec![500, 0]],
            2,
            54,
            700,
        );
        let routes = NearestNeighborSolver::new().solve(&problem).unwrap();
        assert_eq!(routes.len(), 2);
        for route in &routes {
            assert!(route.time(&problem) <= 700);
        }
    }

    #[test]
    fn test_oversized_stop_is_infeasible() {
        let problem = problem(vec![stop("a", 60, 300)], vec![vec![0]], 3, 54, 2700);
        let err = NearestNeighborSolver::new().solve(&problem).unwrap_err();
        assert!(matches!(err, PlannerError::InfeasibleRoute { .. }));
    }

    #[test]
    fn test_too_few_buses_is_infeasible() {
        let problem = problem(
            vec![stop("a", 3, 300), stop("b", 3, 360)],
            vec![vec![0, 120], vec![120, 0]],
            1,
            4,
            2700,
        );
        assert!(NearestNeighborSolver::new().solve(&problem).is_err());
    }
}
