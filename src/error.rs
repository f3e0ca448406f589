//! Planner error kinds

use thiserror::Error;

/// Errors raised while building, solving or reallocating routes.
///
/// Only `Io` and `Csv` failures on run-level inputs are fatal. The three
/// domain kinds are recovered per school or per bus and surface in the
/// run report.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Malformed or empty stop/matrix input, mismatched dimensions
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The route solver found no solution for a school
    #[error("no feasible routes for school {school}: {reason}")]
    InfeasibleRoute { school: String, reason: String },

    /// A bus exhausted its candidate schools without an acceptable next leg
    #[error("bus {bus} has no acceptable next leg in tier {tier}")]
    UnassignableBus { bus: usize, tier: u8 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PlannerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn infeasible(school: &str, reason: impl Into<String>) -> Self {
        Self::InfeasibleRoute {
            school: school.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
