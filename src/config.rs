//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{self, Context, Result};
use chrono::NaiveTime;

use crate::defaults::*;
use crate::services::orchestrator::WaveSettings;
use crate::services::problem::ServiceTime;
use crate::services::reallocation::{DeadheadModel, MatchingStrategy};
use crate::services::vrp::{SolverConfig, SolverKind};
use crate::types::TierPlan;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the tier directories and the school location table
    pub data_dir: PathBuf,

    /// Where the bus assignment table goes
    pub output_file: PathBuf,

    pub fleet_size: usize,
    pub bus_capacity: u32,

    /// Route ceiling in seconds, also the matching ceiling
    pub max_route_seconds: u64,
    pub tier_max_route_seconds: Vec<u64>,

    pub service: ServiceTime,
    pub deadhead: DeadheadModel,
    pub solver: SolverConfig,

    /// Explicit tier grouping; derived from the school table when absent
    pub tier_schools: Option<TierPlan>,
    pub dismissal_times: Vec<NaiveTime>,

    pub matching: MatchingStrategy,
    pub route_solver: SolverKind,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = get("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let output_file = get("OUTPUT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        let fleet_size = parse_or(get("FLEET_SIZE"), "FLEET_SIZE", DEFAULT_FLEET_SIZE)?;
        if fleet_size == 0 {
            anyhow::bail!("FLEET_SIZE must be at least 1");
        }
        let bus_capacity = parse_or(get("BUS_CAPACITY"), "BUS_CAPACITY", DEFAULT_BUS_CAPACITY)?;
        if bus_capacity == 0 {
            anyhow::bail!("BUS_CAPACITY must be at least 1");
        }

        let max_route_seconds = parse_or(
            get("MAX_ROUTE_SECONDS"),
            "MAX_ROUTE_SECONDS",
            DEFAULT_MAX_ROUTE_SECONDS,
        )?;
        let tier_max_route_seconds = parse_list(get("TIER_MAX_ROUTE_SECONDS"), "TIER_MAX_ROUTE_SECONDS")?;

        let service = ServiceTime {
            base_seconds: parse_or(
                get("SERVICE_BASE_SECONDS"),
                "SERVICE_BASE_SECONDS",
                DEFAULT_SERVICE_BASE_SECONDS,
            )?,
            rider_threshold: parse_or(
                get("SERVICE_RIDER_THRESHOLD"),
                "SERVICE_RIDER_THRESHOLD",
                DEFAULT_SERVICE_RIDER_THRESHOLD,
            )?,
            seconds_per_rider: parse_or(
                get("SERVICE_SECONDS_PER_RIDER"),
                "SERVICE_SECONDS_PER_RIDER",
                DEFAULT_SERVICE_SECONDS_PER_RIDER,
            )?,
        };

        let deadhead = DeadheadModel {
            road_factor: parse_or(get("ROAD_FACTOR"), "ROAD_FACTOR", DEFAULT_ROAD_FACTOR)?,
            speed_mps: parse_or(get("BUS_SPEED_MPS"), "BUS_SPEED_MPS", DEFAULT_BUS_SPEED_MPS)?,
        };
        if deadhead.speed_mps <= 0.0 || deadhead.road_factor <= 0.0 {
            anyhow::bail!("ROAD_FACTOR and BUS_SPEED_MPS must be positive");
        }

        let solver = SolverConfig::new(
            parse_or(get("SOLVER_MAX_SECONDS"), "SOLVER_MAX_SECONDS", DEFAULT_SOLVER_MAX_SECONDS)?,
            parse_or(
                get("SOLVER_MAX_GENERATIONS"),
                "SOLVER_MAX_GENERATIONS",
                DEFAULT_SOLVER_MAX_GENERATIONS,
            )?,
        );

        let tier_schools = get("TIER_SCHOOLS")
            .map(|value| TierPlan::parse(&value))
            .transpose()
            .context("TIER_SCHOOLS must look like A,B;C,D;E")?;

        let dismissal_times = get("DISMISSAL_TIMES")
            .map(|value| {
                value
                    .split(',')
                    .map(|time| {
                        NaiveTime::parse_from_str(time.trim(), "%H:%M")
                            .with_context(|| format!("DISMISSAL_TIMES entry '{}' is not HH:MM", time.trim()))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let matching = parse_or(
            get("MATCHING_STRATEGY"),
            "MATCHING_STRATEGY",
            MatchingStrategy::TimeAware,
        )?;
        let route_solver = parse_or(get("ROUTE_SOLVER"), "ROUTE_SOLVER", SolverKind::Pragmatic)?;

        Ok(Self {
            data_dir,
            output_file,
            fleet_size,
            bus_capacity,
            max_route_seconds,
            tier_max_route_seconds,
            service,
            deadhead,
            solver,
            tier_schools,
            dismissal_times,
            matching,
            route_solver,
        })
    }

    /// Limits handed to the wave orchestrator
    pub fn wave_settings(&self) -> WaveSettings {
        WaveSettings {
            fleet_size: self.fleet_size,
            bus_capacity: self.bus_capacity,
            max_route_seconds: self.max_route_seconds,
            tier_max_route_seconds: self.tier_max_route_seconds.clone(),
            dismissal_times: self.dismissal_times.clone(),
            default_dismissal: default_dismissal_time(),
            service: self.service,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, err)),
        None => Ok(default),
    }
}

fn parse_list<T>(value: Option<String>, key: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = value else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|item| {
            item.trim()
                .parse()
                .map_err(|err| anyhow::anyhow!("{} has invalid entry '{}': {}", key, item.trim(), err))
        })
        .collect()
}
