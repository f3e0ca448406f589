//! VRP Solver configuration

use crate::defaults::{DEFAULT_SOLVER_MAX_GENERATIONS, DEFAULT_SOLVER_MAX_SECONDS};

/// Search budget for the vrp-pragmatic solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum solving time in seconds per school
    pub max_time_seconds: u32,
    /// Maximum generations for metaheuristic
    pub max_generations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_time_seconds: DEFAULT_SOLVER_MAX_SECONDS,
            max_generations: DEFAULT_SOLVER_MAX_GENERATIONS,
        }
    }
}

impl SolverConfig {
    /// Create config with custom values
    pub fn new(max_time_seconds: u32, max_generations: usize) -> Self {
        Self {
            max_time_seconds,
            max_generations,
        }
    }

    /// Instant configuration for very fast response
    /// - Minimal solve time (~2 seconds)
    /// - May not find optimal solution
    pub fn instant() -> Self {
        Self {
            max_time_seconds: 2,
            max_generations: 200,
        }
    }
}
