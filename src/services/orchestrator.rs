//! Wave orchestrator
//!
//! Walks the tiers in order, solves every school's routing problem and
//! collects the routes the reallocation engine works from.

use std::time::Instant;

use chrono::NaiveTime;
use tracing::{debug, error, info, warn};

use crate::data::matrix::load_time_matrix;
use crate::data::routes::{read_route_terminals, write_route_table};
use crate::data::stops::load_stops;
use crate::data::DataLayout;
use crate::error::PlannerResult;
use crate::services::problem::{build_routing_problem, ProblemParams, ServiceTime};
use crate::services::vrp::{materialize_routes, RouteSolver};
use crate::types::{stops_for_school, Route, RouteBook, Stop, TerminalStops, Tier, TierPlan};

/// Routing limits shared by every wave
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSettings {
    pub fleet_size: usize,
    pub bus_capacity: u32,
    pub max_route_seconds: u64,
    /// Ceiling per tier, first entry is tier 1; missing tiers use the global one
    pub tier_max_route_seconds: Vec<u64>,
    /// Dismissal time per tier; missing tiers use the default
    pub dismissal_times: Vec<NaiveTime>,
    pub default_dismissal: NaiveTime,
    pub service: ServiceTime,
}

impl WaveSettings {
    pub fn route_ceiling(&self, tier: u8) -> u64 {
        tier_entry(&self.tier_max_route_seconds, tier)
            .copied()
            .unwrap_or(self.max_route_seconds)
    }

    pub fn dismissal(&self, tier: u8) -> NaiveTime {
        tier_entry(&self.dismissal_times, tier)
            .copied()
            .unwrap_or(self.default_dismissal)
    }

    fn problem_params(&self, tier: u8) -> ProblemParams {
        ProblemParams {
            vehicle_count: self.fleet_size,
            vehicle_capacity: self.bus_capacity,
            max_route_seconds: self.route_ceiling(tier),
            shift_start: self.dismissal(tier),
        }
    }
}

fn tier_entry<T>(values: &[T], tier: u8) -> Option<&T> {
    usize::from(tier).checked_sub(1).and_then(|i| values.get(i))
}

/// Per-school totals after routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolSummary {
    pub school: String,
    pub tier: u8,
    pub routes: usize,
    /// Riders waiting at the school's stops
    pub riders: u64,
    /// Riders on the school's routes
    pub carried: u64,
}

impl SchoolSummary {
    pub fn conserves_riders(&self) -> bool {
        self.riders == self.carried
    }
}

/// A school (or a whole tier) that produced no routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolFailure {
    pub tier: u8,
    /// `None` when the whole tier could not be loaded
    pub school: Option<String>,
    pub reason: String,
}

/// Everything the routing waves produced
#[derive(Debug, Clone, Default)]
pub struct WaveResult {
    pub routes: RouteBook,
    pub terminals: TerminalStops,
    pub summaries: Vec<SchoolSummary>,
    pub failures: Vec<SchoolFailure>,
}

impl WaveResult {
    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}

pub struct WaveOrchestrator<'a> {
    layout: &'a DataLayout,
    settings: &'a WaveSettings,
    solver: &'a dyn RouteSolver,
}

impl<'a> WaveOrchestrator<'a> {
    pub fn new(layout: &'a DataLayout, settings: &'a WaveSettings, solver: &'a dyn RouteSolver) -> Self {
        Self {
            layout,
            settings,
            solver,
        }
    }

    /// Route every tier in order. Failures are recorded and skipped.
    pub fn run(&self, plan: &TierPlan) -> WaveResult {
        let mut result = WaveResult::default();
        for tier in plan.tiers() {
            self.run_tier(tier, &mut result);
        }

        info!(
            "Routing finished: {} routes for {} schools, {} failures",
            result.route_count(),
            result.summaries.len(),
            result.failures.len()
        );
        result
    }

    fn run_tier(&self, tier: &Tier, result: &mut WaveResult) {
        let started_at = Instant::now();
        let stops_path = self.layout.stops_file(tier.number);
        info!(
            "Tier {}: {} schools, dismissal {}, ceiling {} s",
            tier.number,
            tier.schools.len(),
            self.settings.dismissal(tier.number),
            self.settings.route_ceiling(tier.number)
        );

        let stops = match load_stops(&stops_path) {
            Ok(stops) => stops,
            Err(err) => {
                error!("Tier {}: cannot load {}: {}", tier.number, stops_path.display(), err);
                result.failures.push(SchoolFailure {
                    tier: tier.number,
                    school: None,
                    reason: err.to_string(),
                });
                return;
            }
        };

        for school in &tier.schools {
            let school_stops = stops_for_school(&stops, school);
            let riders: u64 = school_stops.iter().map(|s| u64::from(s.riders)).sum();

            let routes = match self.route_school(tier.number, school, &stops) {
                Ok(routes) => routes,
                Err(err) => {
                    warn!("{}: no routes, {}", school, err);
                    result.failures.push(SchoolFailure {
                        tier: tier.number,
                        school: Some(school.clone()),
                        reason: err.to_string(),
                    });
                    Vec::new()
                }
            };

            let carried: u64 = routes.iter().map(|r| u64::from(r.load)).sum();
            let summary = SchoolSummary {
                school: school.clone(),
                tier: tier.number,
                routes: routes.len(),
                riders,
                carried,
            };
            if !routes.is_empty() && !summary.conserves_riders() {
                warn!(
                    "{}: routes carry {} riders but stops hold {}",
                    school, carried, riders
                );
            }
            info!("{}: {} buses for {} riders", school, routes.len(), riders);

            self.record_terminals(tier.number, school, &routes, &mut result.terminals);
            result.summaries.push(summary);
            result.routes.insert(school.clone(), routes);
        }

        debug!("Tier {} routed in {} ms", tier.number, started_at.elapsed().as_millis());
    }

    /// Build, solve and materialize one school
    pub fn route_school(&self, tier: u8, school: &str, tier_stops: &[Stop]) -> PlannerResult<Vec<Route>> {
        let stop_times = load_time_matrix(&self.layout.distance_file(tier, school))?;
        let problem = build_routing_problem(
            school,
            tier_stops,
            &stop_times,
            &self.settings.problem_params(tier),
            &self.settings.service,
        )?;

        debug!(
            "{}: {} stops, {} riders, solving with {}",
            school,
            problem.stops.len(),
            problem.total_riders(),
            self.solver.name()
        );
        let solved = self.solver.solve(&problem)?;
        Ok(materialize_routes(&problem, &solved))
    }

    /// Persist the route table and read each route's last stop back.
    ///
    /// Falls back to the in-memory routes when the table cannot be written.
    fn record_terminals(&self, tier: u8, school: &str, routes: &[Route], terminals: &mut TerminalStops) {
        let path = self.layout.route_file(tier, school);
        let persisted = write_route_table(&path, routes)
            .and_then(|_| read_route_terminals(&path, school, terminals));

        match persisted {
            Ok(count) => debug!("{}: {} route terminals from {}", school, count, path.display()),
            Err(err) => {
                warn!("{}: route table {} unusable: {}", school, path.display(), err);
                for route in routes {
                    if let Some(visit) = route.terminal() {
                        terminals.insert(school, route.index, visit.coordinates);
                    }
                }
            }
        }
    }
}
