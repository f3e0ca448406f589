//! Per-school route table.
//!
//! One row per stop visit, `order` is 1-based within the route:
//!
//! ```csv
//! route,latitude,longitude,stop,count,order
//! 0,35.22,-80.84,Oak & 5th,4,1
//! 0,35.23,-80.85,Elm,12,2
//! ```
//!
//! The reallocation engine reads the table back for each route's last stop.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

use crate::error::PlannerResult;
use crate::types::{Coordinates, Route, TerminalStops};

#[derive(Deserialize)]
struct RouteRecord {
    route: usize,
    latitude: f64,
    longitude: f64,
    order: u32,
}

/// Write one school's routes, creating the tier directory if needed
pub fn write_route_table(path: &Path, routes: &[Route]) -> PlannerResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_route_table_writer(file, routes)
}

pub fn write_route_table_writer<W: Write>(writer: W, routes: &[Route]) -> PlannerResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["route", "latitude", "longitude", "stop", "count", "order"])?;

    for route in routes {
        for (order, visit) in route.visits.iter().enumerate() {
            csv_writer.write_record(&[
                route.index.to_string(),
                visit.coordinates.lat.to_string(),
                visit.coordinates.lng.to_string(),
                visit.label.clone(),
                visit.riders.to_string(),
                (order + 1).to_string(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Read a school's route table back and collect each route's last stop
pub fn read_route_terminals(path: &Path, school: &str, into: &mut TerminalStops) -> PlannerResult<usize> {
    let file = std::fs::File::open(path)?;
    read_route_terminals_reader(file, school, into)
}

/// Like [`read_route_terminals`] but accepts any `Read` source.
///
/// Returns the number of routes found.
pub fn read_route_terminals_reader<R: Read>(
    reader: R,
    school: &str,
    into: &mut TerminalStops,
) -> PlannerResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut last_by_route: BTreeMap<usize, (u32, Coordinates)> = BTreeMap::new();

    for result in csv_reader.deserialize::<RouteRecord>() {
        let row = result?;
        let coordinates = Coordinates {
            lat: row.latitude,
            lng: row.longitude,
        };
        let entry = last_by_route.entry(row.route).or_insert((row.order, coordinates));
        if row.order >= entry.0 {
            *entry = (row.order, coordinates);
        }
    }

    for (&route, &(_, coordinates)) in &last_by_route {
        into.insert(school, route, coordinates);
    }
    Ok(last_by_route.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RouteVisit;
    use std::io::Cursor;

    fn visit(label: &str, lat: f64, riders: u32, cumulative_load: u32) -> RouteVisit {
        RouteVisit {
            label: label.to_string(),
            coordinates: Coordinates { lat, lng: -80.0 },
            riders,
            cumulative_load,
        }
    }

    fn routes() -> Vec<Route> {
        vec![
            Route {
                school: "JHS".to_string(),
                index: 0,
                visits: vec![visit("a", 35.1, 2, 2), visit("b", 35.2, 3, 5)],
                duration: 400,
                load: 5,
            },
            Route {
                school: "JHS".to_string(),
                index: 1,
                visits: vec![visit("c", 35.3, 7, 7)],
                duration: 300,
                load: 7,
            },
        ]
    }

    #[test]
    fn test_write_route_table_rows() {
        let mut buffer = Vec::new();
        write_route_table_writer(&mut buffer, &routes()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "route,latitude,longitude,stop,count,order");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0,35.1,-80,a,2,1");
        assert_eq!(lines[2], "0,35.2,-80,b,3,2");
        assert_eq!(lines[3], "1,35.3,-80,c,7,1");
    }

    #[test]
    fn test_terminals_read_back_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tier1").join("JHS_pmRouteData.csv");
        write_route_table(&path, &routes()).unwrap();

        let mut terminals = TerminalStops::new();
        let count = read_route_terminals(&path, "JHS", &mut terminals).unwrap();

        assert_eq!(count, 2);
        assert!((terminals.get("JHS", 0).unwrap().lat - 35.2).abs() < 1e-9);
        assert!((terminals.get("JHS", 1).unwrap().lat - 35.3).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_uses_highest_order() {
        let csv = "route,latitude,longitude,stop,count,order\n\
                   0,35.9,-80,z,1,3\n\
                   0,35.1,-80,a,1,1\n";
        let mut terminals = TerminalStops::new();
        read_route_terminals_reader(Cursor::new(csv), "JHS", &mut terminals).unwrap();
        assert!((terminals.get("JHS", 0).unwrap().lat - 35.9).abs() < 1e-9);
    }
}
