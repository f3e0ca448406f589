//! CLI argument parsing for the school-bus-planner binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::services::reallocation::MatchingStrategy;
use crate::services::vrp::SolverKind;

#[derive(Parser)]
#[command(name = "school-bus-planner", about = "Afternoon school bus routing and fleet reallocation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand)]
pub enum Command {
    /// Route every tier and assign buses (default if no subcommand given)
    Plan,
    /// Route every tier and write the route tables only
    Routes,
}

/// Values that take precedence over the environment
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Directory holding school_locations.csv and the Tier folders
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Bus assignment table to write
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Matching strategy: simple or time-aware
    #[arg(long, global = true, value_parser = parse_strategy)]
    pub strategy: Option<MatchingStrategy>,

    /// Route solver: pragmatic or nearest
    #[arg(long, global = true, value_parser = parse_solver)]
    pub solver: Option<SolverKind>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(strategy) = self.strategy {
            config.matching = strategy;
        }
        if let Some(solver) = self.solver {
            config.route_solver = solver;
        }
    }
}

fn parse_strategy(value: &str) -> Result<MatchingStrategy, String> {
    value.parse().map_err(|err: crate::error::PlannerError| err.to_string())
}

fn parse_solver(value: &str) -> Result<SolverKind, String> {
    value.parse().map_err(|err: crate::error::PlannerError| err.to_string())
}
