//! Matching bounded by the route-duration ceiling

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{DemandLedger, MatchingPolicy, ReallocationContext};
use crate::services::geo::SchoolDistance;
use crate::types::{Fleet, Leg};

/// Candidate lists of buses past their first leg are always looked up under
/// this tier, whatever tier the bus actually finished.
pub const CHAINED_CANDIDATE_TIER: u8 = 2;

/// A bus finishing a leg in this tier may move to `BYPASS_TO_TIER` over the
/// ceiling. No other tier pair is exempt.
const BYPASS_FROM_TIER: u8 = 1;
const BYPASS_TO_TIER: u8 = 3;

type TerminalKey = (u8, String, usize);

/// Greedy matching that charges the drive to the leg the bus just finished.
///
/// Candidates are every school of a later tier, nearest first. A candidate
/// is taken when the finished leg plus the drive fits the ceiling, or when
/// a tier-1 bus moves to a tier-3 school.
#[derive(Debug, Clone, Default)]
pub struct TimeAwareMatching {
    candidates: Option<HashMap<TerminalKey, Vec<SchoolDistance>>>,
}

impl TimeAwareMatching {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranked later-tier schools for every route terminal of every tier
    /// but the last
    fn build_candidates(ctx: &ReallocationContext<'_>) -> HashMap<TerminalKey, Vec<SchoolDistance>> {
        let mut candidates = HashMap::new();
        let tiers = ctx.plan.tiers();

        for tier in tiers.iter().take(tiers.len().saturating_sub(1)) {
            for school in &tier.schools {
                let Some(routes) = ctx.routes.get(school) else {
                    continue;
                };
                for route in routes {
                    let Some(from) = ctx.terminals.get(school, route.index) else {
                        continue;
                    };
                    let ranked = ctx.directory.ranked_from(from, |t| t > tier.number);
                    candidates.insert((tier.number, school.clone(), route.index), ranked);
                }
            }
        }

        debug!("Prepared candidate lists for {} route terminals", candidates.len());
        candidates
    }

    fn candidates_for(&self, chain: &[Leg], tier: u8) -> Vec<SchoolDistance> {
        let (Some(table), Some(last)) = (&self.candidates, chain.last()) else {
            return Vec::new();
        };

        if chain.len() == 1 {
            table
                .get(&(last.tier, last.school.clone(), last.route))
                .map(|list| list.iter().filter(|c| c.tier == tier).cloned().collect())
                .unwrap_or_default()
        } else {
            table
                .get(&(CHAINED_CANDIDATE_TIER, last.school.clone(), last.route))
                .cloned()
                .unwrap_or_default()
        }
    }
}

impl MatchingPolicy for TimeAwareMatching {
    fn name(&self) -> &str {
        "time-aware"
    }

    fn match_wave(
        &mut self,
        ctx: &ReallocationContext<'_>,
        tier: u8,
        fleet: &mut Fleet,
        ledger: &mut DemandLedger,
    ) -> (usize, Vec<usize>) {
        if self.candidates.is_none() {
            self.candidates = Some(Self::build_candidates(ctx));
        }

        let mut matched = 0;
        let mut stranded = Vec::new();

        for bus in 0..fleet.size() {
            let chain = fleet.chain(bus);
            let Some(last) = chain.last().cloned() else {
                continue;
            };
            if last.tier >= tier {
                continue;
            }

            let candidates = self.candidates_for(chain, tier);
            let mut accepted = None;
            for candidate in candidates {
                if ledger.remaining(&candidate.school) == 0 {
                    continue;
                }
                let drive = ctx.deadhead.seconds(candidate.distance_m);
                let bypass = last.tier == BYPASS_FROM_TIER && candidate.tier == BYPASS_TO_TIER;
                if last.duration + drive <= ctx.max_route_seconds || bypass {
                    accepted = Some((candidate, drive));
                    break;
                }
                debug!(
                    "Bus {}: {} rejected, {} s + {} s over {} s",
                    bus, candidate.school, last.duration, drive, ctx.max_route_seconds
                );
            }

            let Some((candidate, drive)) = accepted else {
                stranded.push(bus);
                continue;
            };
            let Some(route) = ledger.claim(&candidate.school) else {
                warn!("{} lost its demand while bus {} was matching", candidate.school, bus);
                stranded.push(bus);
                continue;
            };

            debug!(
                "Bus {}: {} -> {} route {} ({:.0} m, {} s)",
                bus, last.school, candidate.school, route, candidate.distance_m, drive
            );
            if let Some(finished) = fleet.last_leg_mut(bus) {
                finished.duration += drive;
            }
            fleet.push_leg(
                bus,
                Leg {
                    duration: ctx.route_duration(&candidate.school, route),
                    school: candidate.school,
                    route,
                    tier: candidate.tier,
                },
            );
            matched += 1;
        }

        (matched, stranded)
    }
}
