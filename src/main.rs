//! School Bus Planner - afternoon route planning and fleet reallocation
//!
//! Routes every school of every dismissal tier, then chains the fleet
//! across tiers and writes one row per bus leg.

mod cli;
mod config;
mod data;
mod defaults;
mod error;
mod services;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,school_bus_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    cli.overrides.apply(&mut config);
    info!(
        "Configuration loaded: data in {}, {:?} matching, {:?} solver",
        config.data_dir.display(),
        config.matching,
        config.route_solver
    );

    match cli.command.unwrap_or(Command::Plan) {
        Command::Plan => {
            let report = services::pipeline::run_plan(&config).map_err(|e| {
                error!("Planning failed: {:#}", e);
                e
            })?;
            if !report.is_complete() {
                info!(
                    "Plan written with {} unrouted schools and {} uncovered routes",
                    report.failures.len(),
                    report.unmet_routes()
                );
            }
        }
        Command::Routes => {
            let routed = services::pipeline::route_waves(&config)?;
            info!(
                "Wrote route tables for {} routes, {} schools failed",
                routed.waves.route_count(),
                routed.waves.failures.len()
            );
        }
    }

    Ok(())
}
