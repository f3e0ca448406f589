//! Materialized route types

use std::collections::HashMap;

use super::Coordinates;

/// One stop visit inside a route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteVisit {
    pub label: String,
    pub coordinates: Coordinates,
    /// Riders boarding at this stop
    pub riders: u32,
    /// Riders on board after leaving this stop
    pub cumulative_load: u32,
}

/// One vehicle's visitation plan for one school
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub school: String,
    /// Index within the school's route list (materialization order)
    pub index: usize,
    pub visits: Vec<RouteVisit>,
    /// Travel plus service time in seconds
    pub duration: u64,
    /// Riders carried
    pub load: u32,
}

impl Route {
    /// Last stop of the route, where the bus ends up after the wave
    pub fn terminal(&self) -> Option<&RouteVisit> {
        self.visits.last()
    }
}

/// Routes of every school, keyed by school code
pub type RouteBook = HashMap<String, Vec<Route>>;

/// Where each (school, route) leaves its bus at the end of the wave
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminalStops {
    stops: HashMap<(String, usize), Coordinates>,
}

impl TerminalStops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_routes<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Self {
        let mut terminals = Self::new();
        for route in routes {
            if let Some(visit) = route.terminal() {
                terminals.insert(&route.school, route.index, visit.coordinates);
            }
        }
        terminals
    }

    pub fn insert(&mut self, school: &str, route: usize, coordinates: Coordinates) {
        self.stops.insert((school.to_string(), route), coordinates);
    }

    pub fn get(&self, school: &str, route: usize) -> Option<&Coordinates> {
        self.stops.get(&(school.to_string(), route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(label: &str, riders: u32, cumulative_load: u32) -> RouteVisit {
        RouteVisit {
            label: label.to_string(),
            coordinates: Coordinates { lat: 35.0, lng: -80.0 },
            riders,
            cumulative_load,
        }
    }

    #[test]
    fn test_terminal_is_last_visit() {
        let route = Route {
            school: "JHS".to_string(),
            index: 0,
            visits: vec![visit("a", 2, 2), visit("b", 3, 5)],
            duration: 600,
            load: 5,
        };
        assert_eq!(route.terminal().map(|v| v.label.as_str()), Some("b"));
    }

    #[test]
    fn test_terminal_stops_from_routes() {
        let route = Route {
            school: "JHS".to_string(),
            index: 1,
            visits: vec![visit("a", 2, 2), visit("b", 3, 5)],
            duration: 600,
            load: 5,
        };
        let terminals = TerminalStops::from_routes([&route]);
        let terminal = terminals.get("JHS", 1).unwrap();
        assert_eq!(terminal.lat, route.visits[1].coordinates.lat);
        assert!(terminals.get("JHS", 0).is_none());
    }

    #[test]
    fn test_terminal_of_empty_route() {
        let route = Route {
            school: "JHS".to_string(),
            index: 0,
            visits: vec![],
            duration: 0,
            load: 0,
        };
        assert!(route.terminal().is_none());
    }
}
