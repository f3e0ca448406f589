//! End-to-end planning run

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::data::schools::load_schools;
use crate::data::DataLayout;
use crate::services::emitter::{emit_assignments, PlanReport};
use crate::services::orchestrator::{WaveOrchestrator, WaveResult};
use crate::services::reallocation::{reallocate, ReallocationContext};
use crate::services::vrp::create_route_solver;
use crate::types::{School, TierPlan};

/// Routed waves plus the inputs the reallocation engine needs
pub struct RoutedWaves {
    pub plan: TierPlan,
    pub schools: Vec<School>,
    pub waves: WaveResult,
}

/// Tier grouping from the config, else from the school table
fn resolve_tier_plan(config: &Config, schools: &[School]) -> Result<TierPlan> {
    if let Some(plan) = &config.tier_schools {
        for school in plan.schools() {
            if !schools.iter().any(|s| s.code == school) {
                warn!("{} is not in the school location table", school);
            }
        }
        return Ok(plan.clone());
    }
    TierPlan::from_schools(schools).context("Failed to group schools into tiers")
}

/// Solve every school of every tier and persist the route tables
pub fn route_waves(config: &Config) -> Result<RoutedWaves> {
    let layout = DataLayout::new(&config.data_dir);
    let schools_path = layout.school_locations_file();
    let schools = load_schools(&schools_path)
        .with_context(|| format!("Failed to load {}", schools_path.display()))?;
    let plan = resolve_tier_plan(config, &schools)?;
    info!(
        "Planning {} tiers, {} schools, {} buses of {} seats",
        plan.len(),
        plan.schools().count(),
        config.fleet_size,
        config.bus_capacity
    );

    let settings = config.wave_settings();
    let solver = create_route_solver(config.route_solver, config.solver.clone());
    let waves = WaveOrchestrator::new(&layout, &settings, solver.as_ref()).run(&plan);

    Ok(RoutedWaves {
        plan,
        schools,
        waves,
    })
}

/// Route, reallocate and write the assignment table
pub fn run_plan(config: &Config) -> Result<PlanReport> {
    let RoutedWaves {
        plan,
        schools,
        waves,
    } = route_waves(config)?;

    let ctx = ReallocationContext::new(
        &plan,
        &waves.routes,
        &waves.terminals,
        schools,
        config.deadhead,
        config.max_route_seconds,
    );
    let mut policy = config.matching.create();
    let reallocation = reallocate(&ctx, policy.as_mut(), config.fleet_size)?;

    emit_assignments(&config.output_file, &reallocation.fleet, &waves.routes)
        .with_context(|| format!("Failed to write {}", config.output_file.display()))?;

    let report = PlanReport::new(&plan, &waves, &reallocation);
    report.log();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reallocation::MatchingStrategy;
    use crate::services::vrp::SolverKind;
    use std::fs;
    use std::path::Path;

    fn nearest_config(root: &Path) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.data_dir = root.to_path_buf();
        config.output_file = root.join("bus_assignments.csv");
        config.route_solver = SolverKind::NearestNeighbor;
        config
    }

    #[test]
    fn test_fleet_of_three_single_school() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("school_locations.csv"),
            "longitude,latitude,school,tier\n-80.0,35.0,JHS,1\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("Tier1")).unwrap();
        fs::write(
            dir.path().join("Tier1/Tier1_pm.csv"),
            "longitude,latitude,school,stop,riders,time_to_school\n\
             -80.01,35.01,JHS,Oak,2,300\n\
             -80.02,35.02,JHS,Elm,2,360\n",
        )
        .unwrap();
        fs::write(dir.path().join("Tier1/JHS_pmDistance.csv"), "0,120\n120,0\n").unwrap();

        let mut config = nearest_config(dir.path());
        config.fleet_size = 3;
        config.bus_capacity = 4;

        let report = run_plan(&config).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.legs, 1);
        assert_eq!(report.idle_buses, 2);
        let output = fs::read_to_string(&config.output_file).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("0,JHS,0,"));
        assert!(lines[1].ends_with(",4"));
    }

    #[test]
    fn test_three_tiers_reuse_buses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("school_locations.csv"),
            "longitude,latitude,school,tier\n\
             -80.0,35.0,JHS,1\n\
             -80.0,35.01,HMS,2\n\
             -80.0,35.02,ELM,3\n",
        )
        .unwrap();
        for (tier, school) in [(1, "JHS"), (2, "HMS"), (3, "ELM")] {
            let tier_dir = dir.path().join(format!("Tier{}", tier));
            fs::create_dir_all(&tier_dir).unwrap();
            fs::write(
                tier_dir.join(format!("Tier{}_pm.csv", tier)),
                format!(
                    "longitude,latitude,school,stop,riders,time_to_school\n\
                     -80.0,35.0{},{},Main,20,600\n",
                    tier, school
                ),
            )
            .unwrap();
            fs::write(tier_dir.join(format!("{}_pmDistance.csv", school)), "0\n").unwrap();
        }

        for strategy in [MatchingStrategy::Simple, MatchingStrategy::TimeAware] {
            let mut config = nearest_config(dir.path());
            config.fleet_size = 4;
            config.matching = strategy;

            let report = run_plan(&config).unwrap();

            assert!(report.is_complete(), "{:?}", strategy);
            assert_eq!(report.legs, 3);
            assert_eq!(report.buses_used, 1);
            assert_eq!(report.schools.len(), 3);
        }
    }

    #[test]
    fn test_missing_school_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = nearest_config(dir.path());
        assert!(run_plan(&config).is_err());
    }
}
