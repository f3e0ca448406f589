//! Cross-tier fleet reallocation
//!
//! Wave 1 routes are seeded onto fresh buses. For every later wave each
//! in-service bus is matched from its last stop to a nearby school of the
//! wave that still has unclaimed routes, then leftover demand is swept onto
//! buses that were never used.
//!
//! Matching is greedy and never revisits a decision.

mod simple;
mod time_aware;

pub use simple::SimpleMatching;
pub use time_aware::TimeAwareMatching;

use std::collections::HashMap;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::services::geo::{deadhead_seconds, SchoolDirectory};
use crate::types::{Fleet, Leg, RouteBook, School, TerminalStops, TierPlan};

/// Routes still waiting for a bus, per school
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandLedger {
    remaining: HashMap<String, usize>,
}

impl DemandLedger {
    /// One unit of demand per materialized route
    pub fn from_routes(routes: &RouteBook) -> Self {
        Self {
            remaining: routes
                .iter()
                .map(|(school, list)| (school.clone(), list.len()))
                .collect(),
        }
    }

    pub fn remaining(&self, school: &str) -> usize {
        self.remaining.get(school).copied().unwrap_or(0)
    }

    /// Claim the next route of a school.
    ///
    /// Routes are handed out from the back of the list, so the returned
    /// index is the count left after the claim.
    pub fn claim(&mut self, school: &str) -> Option<usize> {
        let left = self.remaining.get_mut(school)?;
        if *left == 0 {
            return None;
        }
        *left -= 1;
        Some(*left)
    }

    /// Schools with unclaimed routes, in tier order
    pub fn unmet(&self, plan: &TierPlan) -> Vec<(String, usize)> {
        plan.schools()
            .filter_map(|school| {
                let left = self.remaining(school);
                (left > 0).then(|| (school.to_string(), left))
            })
            .collect()
    }

    pub fn total_remaining(&self) -> usize {
        self.remaining.values().sum()
    }
}

/// Empty-bus travel estimate between a terminal stop and a school
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadheadModel {
    pub road_factor: f64,
    pub speed_mps: f64,
}

impl DeadheadModel {
    pub fn seconds(&self, distance_m: f64) -> u64 {
        deadhead_seconds(distance_m, self.road_factor, self.speed_mps)
    }
}

/// Everything a matching policy reads but never changes
pub struct ReallocationContext<'a> {
    pub plan: &'a TierPlan,
    pub routes: &'a RouteBook,
    pub terminals: &'a TerminalStops,
    pub directory: SchoolDirectory,
    pub deadhead: DeadheadModel,
    pub max_route_seconds: u64,
}

impl<'a> ReallocationContext<'a> {
    /// Builds the school directory from the location table.
    ///
    /// Schools outside the tier plan are dropped and the rest take their
    /// tier from the plan.
    pub fn new(
        plan: &'a TierPlan,
        routes: &'a RouteBook,
        terminals: &'a TerminalStops,
        schools: Vec<School>,
        deadhead: DeadheadModel,
        max_route_seconds: u64,
    ) -> Self {
        Self::with_directory(
            plan,
            routes,
            terminals,
            SchoolDirectory::new(align_to_plan(schools, plan)),
            deadhead,
            max_route_seconds,
        )
    }

    pub fn with_directory(
        plan: &'a TierPlan,
        routes: &'a RouteBook,
        terminals: &'a TerminalStops,
        directory: SchoolDirectory,
        deadhead: DeadheadModel,
        max_route_seconds: u64,
    ) -> Self {
        Self {
            plan,
            routes,
            terminals,
            directory,
            deadhead,
            max_route_seconds,
        }
    }

    /// Duration of a materialized route, 0 when unknown
    pub fn route_duration(&self, school: &str, route: usize) -> u64 {
        self.routes
            .get(school)
            .and_then(|list| list.iter().find(|r| r.index == route))
            .map(|r| r.duration)
            .unwrap_or(0)
    }
}

fn align_to_plan(schools: Vec<School>, plan: &TierPlan) -> Vec<School> {
    schools
        .into_iter()
        .filter_map(|mut school| {
            school.tier = plan.tier_of(&school.code)?;
            Some(school)
        })
        .collect()
}

/// What happened in one wave
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveOutcome {
    pub tier: u8,
    /// Buses that continued from an earlier wave
    pub matched: usize,
    /// Routes handed to fresh buses
    pub swept: usize,
    /// In-service buses left without a leg this wave
    pub stranded: Vec<usize>,
}

/// How in-service buses pick their next school
pub trait MatchingPolicy {
    fn name(&self) -> &str;

    /// Give buses already in service a leg in `tier`.
    ///
    /// Buses that get nothing are returned; the engine sweeps leftover
    /// demand afterwards.
    fn match_wave(
        &mut self,
        ctx: &ReallocationContext<'_>,
        tier: u8,
        fleet: &mut Fleet,
        ledger: &mut DemandLedger,
    ) -> (usize, Vec<usize>);
}

/// Selectable matching strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingStrategy {
    Simple,
    TimeAware,
}

impl MatchingStrategy {
    pub fn create(self) -> Box<dyn MatchingPolicy> {
        match self {
            Self::Simple => Box::new(SimpleMatching::new()),
            Self::TimeAware => Box::new(TimeAwareMatching::new()),
        }
    }
}

impl FromStr for MatchingStrategy {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" | "nearest" => Ok(Self::Simple),
            "time-aware" | "time_aware" | "timeaware" => Ok(Self::TimeAware),
            other => Err(PlannerError::configuration(format!(
                "unknown matching strategy '{}', expected simple or time-aware",
                other
            ))),
        }
    }
}

/// Result of a full reallocation run
#[derive(Debug, Clone)]
pub struct Reallocation {
    pub fleet: Fleet,
    pub ledger: DemandLedger,
    pub waves: Vec<WaveOutcome>,
}

impl Reallocation {
    pub fn unmet(&self, plan: &TierPlan) -> Vec<(String, usize)> {
        self.ledger.unmet(plan)
    }
}

/// Assign the wave's leftover routes to buses that have never been used.
///
/// Schools go in tier order, buses in index order. Stops early when the
/// fleet runs out and leaves the rest in the ledger.
///
/// A swept leg records its route duration under every matching policy,
/// simple matching included, rather than a zero placeholder.
pub fn fallback_sweep(
    ctx: &ReallocationContext<'_>,
    tier: u8,
    fleet: &mut Fleet,
    ledger: &mut DemandLedger,
) -> usize {
    let Some(schools) = ctx.plan.tier(tier).map(|t| t.schools.clone()) else {
        return 0;
    };

    let mut assigned = 0;
    for school in &schools {
        while ledger.remaining(school) > 0 {
            let Some(bus) = fleet.first_fresh_bus() else {
                warn!(
                    "Fleet exhausted in tier {}: {} routes of {} left without a bus",
                    tier,
                    ledger.remaining(school),
                    school
                );
                return assigned;
            };
            let Some(route) = ledger.claim(school) else {
                break;
            };
            debug!("Bus {} takes {} route {} (tier {})", bus, school, route, tier);
            fleet.push_leg(
                bus,
                Leg {
                    school: school.clone(),
                    route,
                    tier,
                    duration: ctx.route_duration(school, route),
                },
            );
            assigned += 1;
        }
    }
    assigned
}

/// Seed the first wave onto buses 0, 1, 2, ...
pub fn seed_first_wave(
    ctx: &ReallocationContext<'_>,
    fleet: &mut Fleet,
    ledger: &mut DemandLedger,
) -> usize {
    match ctx.plan.tiers().first() {
        Some(first) => fallback_sweep(ctx, first.number, fleet, ledger),
        None => 0,
    }
}

/// Run every wave with the given policy
pub fn reallocate(
    ctx: &ReallocationContext<'_>,
    policy: &mut dyn MatchingPolicy,
    fleet_size: usize,
) -> PlannerResult<Reallocation> {
    if fleet_size == 0 {
        return Err(PlannerError::configuration("fleet size must be positive"));
    }

    let mut fleet = Fleet::new(fleet_size);
    let mut ledger = DemandLedger::from_routes(ctx.routes);
    let mut waves = Vec::with_capacity(ctx.plan.len());

    for (position, tier) in ctx.plan.tiers().iter().enumerate() {
        let outcome = if position == 0 {
            let swept = seed_first_wave(ctx, &mut fleet, &mut ledger);
            info!("Tier {}: seeded {} routes", tier.number, swept);
            WaveOutcome {
                tier: tier.number,
                swept,
                ..WaveOutcome::default()
            }
        } else {
            let (matched, stranded) = policy.match_wave(ctx, tier.number, &mut fleet, &mut ledger);
            for bus in &stranded {
                let err = PlannerError::UnassignableBus {
                    bus: *bus,
                    tier: tier.number,
                };
                debug!("{}", err);
            }
            let swept = fallback_sweep(ctx, tier.number, &mut fleet, &mut ledger);
            info!(
                "Tier {} ({}): {} buses continued, {} fresh, {} left idle",
                tier.number,
                policy.name(),
                matched,
                swept,
                stranded.len()
            );
            WaveOutcome {
                tier: tier.number,
                matched,
                swept,
                stranded,
            }
        };
        waves.push(outcome);
    }

    let unmet = ledger.total_remaining();
    if unmet > 0 {
        warn!("{} routes were never assigned a bus", unmet);
    }

    Ok(Reallocation {
        fleet,
        ledger,
        waves,
    })
}
