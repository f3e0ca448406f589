//! vrp-pragmatic solver integration.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use vrp_cli::extensions::solve::config::{create_builder_from_config, Config, TerminationConfig};
use vrp_core::solver::Solver;
use vrp_pragmatic::format::problem::{Matrix, PragmaticProblem, Problem};
use vrp_pragmatic::format::solution::{
    write_pragmatic, PragmaticOutputType, Solution as PragmaticSolution,
};

use super::adapter::{job_node, vehicle_index};
use super::{build_pragmatic_matrix, build_pragmatic_problem, SolvedRoute, SolverConfig, DEFAULT_PROFILE};
use crate::services::problem::RoutingProblem;

/// Nominal service date; only clock times matter to the solver
pub fn planning_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 6).unwrap_or(NaiveDate::MIN)
}

/// Outcome of a pragmatic solve before it becomes routes
#[derive(Debug, Clone)]
pub struct PragmaticOutcome {
    pub routes: Vec<SolvedRoute>,
    /// Human-readable reasons for stops the solver could not place
    pub unassigned: Vec<String>,
}

pub fn solve_pragmatic(problem: &RoutingProblem, config: &SolverConfig) -> Result<PragmaticOutcome> {
    if problem.stops.is_empty() {
        return Ok(PragmaticOutcome {
            routes: Vec::new(),
            unassigned: Vec::new(),
        });
    }

    let problem_json = build_pragmatic_problem(problem, planning_date());
    let problem_format: Problem = serde_json::from_value(problem_json)
        .context("Failed to deserialize pragmatic problem")?;

    let matrix: Matrix = build_pragmatic_matrix(problem, DEFAULT_PROFILE);
    let core_problem = (problem_format, vec![matrix])
        .read_pragmatic()
        .context("Failed to build core problem from pragmatic format")?;

    let core_problem = Arc::new(core_problem);
    let solver_config = build_solver_config(core_problem.clone(), config)?;

    let solution = Solver::new(core_problem.clone(), solver_config)
        .solve()
        .context("Failed to solve VRP with vrp-pragmatic")?;

    let pragmatic = write_pragmatic_solution(core_problem.as_ref(), &solution)?;
    Ok(map_solution(&pragmatic))
}

fn build_solver_config(
    problem: Arc<vrp_core::models::Problem>,
    config: &SolverConfig,
) -> Result<vrp_core::rosomaxa::evolution::EvolutionConfig<
    vrp_core::solver::RefinementContext,
    vrp_core::models::GoalContext,
    vrp_core::construction::heuristics::InsertionContext,
>> {
    let config = Config {
        termination: Some(TerminationConfig {
            max_time: Some(config.max_time_seconds as usize),
            max_generations: Some(config.max_generations),
            variation: None,
        }),
        evolution: None,
        hyper: None,
        environment: None,
        telemetry: None,
        output: None,
    };

    let builder = create_builder_from_config(problem, Vec::new(), &config)
        .context("Failed to create solver builder")?;

    builder.build().context("Failed to build solver configuration")
}

fn write_pragmatic_solution(
    problem: &vrp_core::models::Problem,
    solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(problem, solution, PragmaticOutputType::default(), &mut writer)
        .context("Failed to serialize pragmatic solution")?;

    let bytes = writer.into_inner().context("Failed to flush solution writer")?;
    let json = String::from_utf8(bytes).context("Solution is not valid UTF-8")?;
    let parsed: PragmaticSolution = serde_json::from_str(&json)
        .context("Failed to parse pragmatic solution JSON")?;

    Ok(parsed)
}

fn map_solution(solution: &PragmaticSolution) -> PragmaticOutcome {
    let mut by_vehicle: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

    for tour in &solution.tours {
        let Some(vehicle) = vehicle_index(&tour.vehicle_id) else {
            continue;
        };
        let nodes = by_vehicle.entry(vehicle).or_default();
        for stop in &tour.stops {
            for activity in stop.activities() {
                if activity.activity_type == "departure" || activity.activity_type == "arrival" {
                    continue;
                }
                if let Some(node) = job_node(&activity.job_id) {
                    nodes.push(node);
                }
            }
        }
    }

    let mut unassigned = Vec::new();
    if let Some(unassigned_jobs) = &solution.unassigned {
        for job in unassigned_jobs {
            let reasons: Vec<String> = job
                .reasons
                .iter()
                .map(|r| {
                    let desc = if r.description.is_empty() {
                        None
                    } else {
                        Some(r.description.as_str())
                    };
                    format_unassigned_reason(&r.code, desc)
                })
                .collect();

            let reasons_str = if reasons.is_empty() {
                "unknown reason".to_string()
            } else {
                reasons.join(", ")
            };
            unassigned.push(format!("{} - {}", job.job_id, reasons_str));
        }
    }

    PragmaticOutcome {
        routes: by_vehicle
            .into_iter()
            .map(|(vehicle, nodes)| SolvedRoute { vehicle, nodes })
            .collect(),
        unassigned,
    }
}

/// Format unassigned reason code to human-readable message
fn format_unassigned_reason(code: &str, description: Option<&str>) -> String {
    let reason = match code {
        "NO_VEHICLE_SHIFT_TIME" => "shift time exceeded",
        "CAPACITY_CONSTRAINT" => "bus capacity exceeded",
        "TIME_WINDOW_CONSTRAINT" => "time window violated",
        "REACHABLE_CONSTRAINT" => "location not reachable",
        "MAX_DURATION_CONSTRAINT" => "max duration exceeded",
        "MAX_TRAVEL_TIME_CONSTRAINT" => "max travel time exceeded",
        _ => code,
    };

    if let Some(desc) = description {
        format!("{} ({})", reason, desc)
    } else {
        reason.to_string()
    }
}
