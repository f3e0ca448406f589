//! Assignment output and the end-of-run report

use std::path::Path;

use tracing::{info, warn};

use crate::data::assignments::{write_assignments, AssignmentRow};
use crate::error::PlannerResult;
use crate::services::orchestrator::{SchoolFailure, SchoolSummary, WaveResult};
use crate::services::reallocation::Reallocation;
use crate::types::{Fleet, RouteBook, TierPlan};

/// One row per leg, buses in index order and legs in wave order
pub fn assignment_rows(fleet: &Fleet, routes: &RouteBook) -> Vec<AssignmentRow> {
    fleet
        .chains()
        .flat_map(|(bus, legs)| {
            legs.iter().map(move |leg| AssignmentRow {
                bus,
                school: leg.school.clone(),
                route: leg.route,
                duration: leg.duration,
                load: routes
                    .get(&leg.school)
                    .and_then(|list| list.iter().find(|r| r.index == leg.route))
                    .map(|r| r.load)
                    .unwrap_or(0),
            })
        })
        .collect()
}

/// Write the assignment table
pub fn emit_assignments(path: &Path, fleet: &Fleet, routes: &RouteBook) -> PlannerResult<Vec<AssignmentRow>> {
    let rows = assignment_rows(fleet, routes);
    write_assignments(path, &rows)?;
    info!("Wrote {} assignments to {}", rows.len(), path.display());
    Ok(rows)
}

/// Outcome of a full planning run
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub schools: Vec<SchoolSummary>,
    pub failures: Vec<SchoolFailure>,
    /// Schools with routes no bus was assigned to
    pub unmet: Vec<(String, usize)>,
    /// In-service buses that found no next leg, summed over waves
    pub stranded: usize,
    pub buses_used: usize,
    pub idle_buses: usize,
    pub legs: usize,
}

impl PlanReport {
    pub fn new(plan: &TierPlan, waves: &WaveResult, reallocation: &Reallocation) -> Self {
        let idle_buses = reallocation.fleet.idle_buses();
        Self {
            schools: waves.summaries.clone(),
            failures: waves.failures.clone(),
            unmet: reallocation.unmet(plan),
            stranded: reallocation.waves.iter().map(|w| w.stranded.len()).sum(),
            buses_used: reallocation.fleet.size() - idle_buses,
            idle_buses,
            legs: reallocation.fleet.chains().map(|(_, legs)| legs.len()).sum(),
        }
    }

    pub fn unmet_routes(&self) -> usize {
        self.unmet.iter().map(|(_, count)| count).sum()
    }

    /// Every routed school has every route covered and no school failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.unmet.is_empty()
    }

    pub fn log(&self) {
        info!(
            "Plan: {} legs on {} buses, {} idle, {} stranded in later waves",
            self.legs, self.buses_used, self.idle_buses, self.stranded
        );
        for failure in &self.failures {
            match &failure.school {
                Some(school) => warn!("Tier {} school {} not routed: {}", failure.tier, school, failure.reason),
                None => warn!("Tier {} not routed: {}", failure.tier, failure.reason),
            }
        }
        for summary in self.schools.iter().filter(|s| !s.conserves_riders()) {
            warn!(
                "{}: {} of {} riders on routes",
                summary.school, summary.carried, summary.riders
            );
        }
        if !self.unmet.is_empty() {
            warn!("Unmet demand: {} routes without a bus", self.unmet_routes());
            for (school, count) in &self.unmet {
                warn!("  {}: {} routes", school, count);
            }
        }
    }
}
