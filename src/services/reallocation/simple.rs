//! Nearest-school matching without a time ceiling

use tracing::{debug, warn};

use super::{DemandLedger, MatchingPolicy, ReallocationContext};
use crate::types::{Fleet, Leg};

/// Sends every bus that finished the previous tier to the nearest school of
/// the next tier that still needs one. The drive over counts toward the new
/// leg.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMatching;

impl SimpleMatching {
    pub fn new() -> Self {
        Self
    }
}

impl MatchingPolicy for SimpleMatching {
    fn name(&self) -> &str {
        "simple"
    }

    fn match_wave(
        &mut self,
        ctx: &ReallocationContext<'_>,
        tier: u8,
        fleet: &mut Fleet,
        ledger: &mut DemandLedger,
    ) -> (usize, Vec<usize>) {
        let mut matched = 0;
        let mut stranded = Vec::new();

        for bus in fleet.buses_ending_in(tier.saturating_sub(1)) {
            let Some(last) = fleet.last_leg(bus).cloned() else {
                continue;
            };
            let Some(from) = ctx.terminals.get(&last.school, last.route).copied() else {
                warn!("No terminal stop for {} route {}", last.school, last.route);
                stranded.push(bus);
                continue;
            };

            let next = ctx
                .directory
                .nearest_in_tier(&from, tier)
                .into_iter()
                .find(|candidate| ledger.remaining(&candidate.school) > 0);

            let Some(candidate) = next else {
                stranded.push(bus);
                continue;
            };
            let Some(route) = ledger.claim(&candidate.school) else {
                stranded.push(bus);
                continue;
            };

            let drive = ctx.deadhead.seconds(candidate.distance_m);
            debug!(
                "Bus {}: {} -> {} route {} ({:.0} m, {} s)",
                bus, last.school, candidate.school, route, candidate.distance_m, drive
            );
            fleet.push_leg(
                bus,
                Leg {
                    duration: ctx.route_duration(&candidate.school, route) + drive,
                    school: candidate.school,
                    route,
                    tier,
                },
            );
            matched += 1;
        }

        (matched, stranded)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{book, coords, deadhead, route, school};
    use super::super::{fallback_sweep, seed_first_wave};
    use super::*;
    use crate::services::geo::haversine_distance;
    use crate::types::{TerminalStops, TierPlan};

    #[test]
    fn test_nearest_school_with_demand_wins() {
        let plan = TierPlan::parse("A;NEAR,FAR").unwrap();
        let routes = book(vec![
            route("A", 0, 600, 35.0),
            route("A", 1, 600, 35.5),
            route("NEAR", 0, 900, 35.01),
            route("FAR", 0, 900, 35.2),
        ]);
        let terminals = TerminalStops::from_routes(routes.values().flatten());
        let ctx = ReallocationContext::new(
            &plan,
            &routes,
            &terminals,
            vec![school("A", 1, 35.0), school("NEAR", 2, 35.01), school("FAR", 2, 35.2)],
            deadhead(),
            2700,
        );
        let mut fleet = Fleet::new(3);
        let mut ledger = DemandLedger::from_routes(&routes);
        seed_first_wave(&ctx, &mut fleet, &mut ledger);

        let (matched, stranded) = SimpleMatching::new().match_wave(&ctx, 2, &mut fleet, &mut ledger);

        assert_eq!(matched, 2);
        assert!(stranded.is_empty());
        // Bus 0 holds route 1 ending at 35.5, closest to FAR
        assert_eq!(fleet.chain(0)[1].school, "FAR");
        // Bus 1 ends at 35.0 and takes NEAR
        assert_eq!(fleet.chain(1)[1].school, "NEAR");

        let distance = haversine_distance(&coords(35.0), &coords(35.01));
        let drive = deadhead().seconds(distance);
        assert_eq!(fleet.chain(1)[1].duration, 900 + drive);
        assert_eq!(fleet.chain(1)[0].duration, 600);
    }

    #[test]
    fn test_no_ceiling_applied() {
        let plan = TierPlan::parse("A;B").unwrap();
        let routes = book(vec![route("A", 0, 2600, 35.0), route("B", 0, 2600, 36.0)]);
        let terminals = TerminalStops::from_routes(routes.values().flatten());
        let ctx = ReallocationContext::new(
            &plan,
            &routes,
            &terminals,
            vec![school("A", 1, 35.0), school("B", 2, 36.0)],
            deadhead(),
            2700,
        );
        let mut fleet = Fleet::new(2);
        let mut ledger = DemandLedger::from_routes(&routes);
        seed_first_wave(&ctx, &mut fleet, &mut ledger);

        let (matched, _) = SimpleMatching::new().match_wave(&ctx, 2, &mut fleet, &mut ledger);

        assert_eq!(matched, 1);
        assert!(fleet.chain(0)[1].duration > 2700);
    }

    #[test]
    fn test_surplus_buses_stay_put_and_shortfall_is_swept() {
        let plan = TierPlan::parse("A;B").unwrap();
        let routes = book(vec![
            route("A", 0, 600, 35.0),
            route("A", 1, 600, 35.0),
            route("B", 0, 600, 35.1),
        ]);
        let terminals = TerminalStops::from_routes(routes.values().flatten());
        let ctx = ReallocationContext::new(
            &plan,
            &routes,
            &terminals,
            vec![school("A", 1, 35.0), school("B", 2, 35.1)],
            deadhead(),
            2700,
        );
        let mut fleet = Fleet::new(3);
        let mut ledger = DemandLedger::from_routes(&routes);
        seed_first_wave(&ctx, &mut fleet, &mut ledger);

        let (matched, stranded) = SimpleMatching::new().match_wave(&ctx, 2, &mut fleet, &mut ledger);
        assert_eq!(matched, 1);
        assert_eq!(stranded, vec![1]);
        assert_eq!(fallback_sweep(&ctx, 2, &mut fleet, &mut ledger), 0);
        assert_eq!(fleet.idle_buses(), 1);
    }

    #[test]
    fn test_swept_leg_keeps_route_duration() {
        let plan = TierPlan::parse("A;B").unwrap();
        let routes = book(vec![
            route("A", 0, 600, 35.0),
            route("B", 0, 900, 35.01),
            route("B", 1, 700, 35.01),
        ]);
        let terminals = TerminalStops::from_routes(routes.values().flatten());
        let ctx = ReallocationContext::new(
            &plan,
            &routes,
            &terminals,
            vec![school("A", 1, 35.0), school("B", 2, 35.01)],
            deadhead(),
            2700,
        );
        let mut fleet = Fleet::new(2);
        let mut ledger = DemandLedger::from_routes(&routes);
        seed_first_wave(&ctx, &mut fleet, &mut ledger);

        let (matched, _) = SimpleMatching::new().match_wave(&ctx, 2, &mut fleet, &mut ledger);
        assert_eq!(matched, 1);
        assert_eq!(fleet.chain(0)[1].route, 1);
        assert_eq!(fallback_sweep(&ctx, 2, &mut fleet, &mut ledger), 1);

        let swept = &fleet.chain(1)[0];
        assert_eq!((swept.school.as_str(), swept.route), ("B", 0));
        assert_eq!(swept.duration, 900);
    }
}
