//! Route solver adapters
//!
//! Capacitated routing is delegated to vrp-pragmatic, with a deterministic
//! nearest-neighbour construction as fallback and for reproducible runs.

mod adapter;
mod config;
mod nearest;
mod pragmatic;
mod solution;

pub use adapter::{build_pragmatic_matrix, build_pragmatic_problem, DEFAULT_PROFILE};
pub use config::SolverConfig;
pub use nearest::NearestNeighborSolver;
pub use pragmatic::solve_pragmatic;
pub use solution::{materialize_routes, SolvedRoute};

use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::services::problem::RoutingProblem;

/// Matrix in, per-vehicle node sequences out
pub trait RouteSolver {
    /// Solver name for logging
    fn name(&self) -> &str;

    /// Solve one school's problem. Vehicles that stay home may be omitted.
    fn solve(&self, problem: &RoutingProblem) -> PlannerResult<Vec<SolvedRoute>>;
}

/// Which solver backs the wave orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Pragmatic,
    NearestNeighbor,
}

impl FromStr for SolverKind {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pragmatic" | "vrp-pragmatic" => Ok(Self::Pragmatic),
            "nearest" | "nearest-neighbor" | "heuristic" => Ok(Self::NearestNeighbor),
            other => Err(PlannerError::configuration(format!(
                "unknown route solver '{}', expected pragmatic or nearest",
                other
            ))),
        }
    }
}

/// vrp-pragmatic with nearest-neighbour fallback
pub struct VrpSolver {
    config: SolverConfig,
    fallback: NearestNeighborSolver,
}

impl VrpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            fallback: NearestNeighborSolver::new(),
        }
    }
}

impl Default for VrpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl RouteSolver for VrpSolver {
    fn name(&self) -> &str {
        "vrp-pragmatic"
    }

    fn solve(&self, problem: &RoutingProblem) -> PlannerResult<Vec<SolvedRoute>> {
        let started_at = Instant::now();

        if problem.stops.is_empty() {
            debug!("{}: no stops to optimize", problem.school);
            return Ok(Vec::new());
        }

        info!(
            "Solving {} with {} stops using vrp-pragmatic",
            problem.school,
            problem.stops.len(),
        );

        match solve_pragmatic(problem, &self.config) {
            Ok(outcome) if outcome.unassigned.is_empty() => {
                info!(
                    "{} solved with vrp-pragmatic: {} routes in {} ms",
                    problem.school,
                    outcome.routes.iter().filter(|r| !r.nodes.is_empty()).count(),
                    started_at.elapsed().as_millis(),
                );
                Ok(outcome.routes)
            }
            Ok(outcome) => Err(PlannerError::infeasible(
                &problem.school,
                outcome.unassigned.join("; "),
            )),
            Err(err) => {
                warn!(
                    "{}: vrp-pragmatic failed, falling back to heuristic: {:#}",
                    problem.school, err
                );
                self.fallback.solve(problem)
            }
        }
    }
}

/// Create the configured route solver
pub fn create_route_solver(kind: SolverKind, config: SolverConfig) -> Box<dyn RouteSolver> {
    match kind {
        SolverKind::Pragmatic => Box::new(VrpSolver::new(config)),
        SolverKind::NearestNeighbor => Box::new(NearestNeighborSolver::new()),
    }
}
