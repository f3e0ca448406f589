//! Geographic calculations

use crate::types::{Coordinates, School};

/// Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Estimated empty-bus drive time in whole seconds.
///
/// Straight-line meters are scaled to road meters, divided by the average
/// speed and floored.
pub fn deadhead_seconds(distance_m: f64, road_factor: f64, speed_mps: f64) -> u64 {
    if distance_m <= 0.0 || speed_mps <= 0.0 {
        return 0;
    }
    (distance_m * road_factor / speed_mps).floor() as u64
}

/// Source of point-to-point distances in meters
pub trait DistanceProvider: Send + Sync {
    fn distance_m(&self, from: &Coordinates, to: &Coordinates) -> f64;
}

/// Great-circle distances
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl DistanceProvider for HaversineDistance {
    fn distance_m(&self, from: &Coordinates, to: &Coordinates) -> f64 {
        haversine_distance(from, to)
    }
}

/// A school with its distance from some reference point
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolDistance {
    pub school: String,
    pub tier: u8,
    pub distance_m: f64,
}

/// School locations with nearest-school lookups
pub struct SchoolDirectory {
    schools: Vec<School>,
    distances: Box<dyn DistanceProvider>,
}

impl SchoolDirectory {
    pub fn new(schools: Vec<School>) -> Self {
        Self::with_provider(schools, Box::new(HaversineDistance))
    }

    pub fn with_provider(schools: Vec<School>, distances: Box<dyn DistanceProvider>) -> Self {
        Self { schools, distances }
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    /// Schools whose tier passes `accept`, nearest first.
    ///
    /// Equal distances keep location-table order.
    pub fn ranked_from(
        &self,
        from: &Coordinates,
        accept: impl Fn(u8) -> bool,
    ) -> Vec<SchoolDistance> {
        let mut ranked: Vec<SchoolDistance> = self
            .schools
            .iter()
            .filter(|s| accept(s.tier))
            .map(|s| SchoolDistance {
                school: s.code.clone(),
                tier: s.tier,
                distance_m: self.distances.distance_m(from, &s.coordinates),
            })
            .collect();

        ranked.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        ranked
    }

    /// Schools of exactly `tier`, nearest first
    pub fn nearest_in_tier(&self, from: &Coordinates, tier: u8) -> Vec<SchoolDistance> {
        self.ranked_from(from, |t| t == tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(code: &str, tier: u8, lat: f64, lng: f64) -> School {
        School {
            code: code.to_string(),
            coordinates: Coordinates { lat, lng },
            tier,
            depot_capacity: None,
        }
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let south = Coordinates { lat: 35.0, lng: -80.0 };
        let north = Coordinates { lat: 36.0, lng: -80.0 };

        let distance = haversine_distance(&south, &north);

        // One degree along a meridian is ~111.2 km
        assert!((distance - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_across_town() {
        let uptown = Coordinates { lat: 35.227, lng: -80.843 };
        let airport = Coordinates { lat: 35.214, lng: -80.947 };

        let distance = haversine_distance(&uptown, &airport);

        assert!((distance - 9_550.0).abs() < 150.0);
        assert!((haversine_distance(&airport, &uptown) - distance).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates { lat: 35.22, lng: -80.84 };
        assert!(haversine_distance(&point, &point).abs() < 0.001);
    }

    #[test]
    fn test_deadhead_one_kilometer() {
        assert_eq!(deadhead_seconds(1000.0, 1.536, 13.0), 118);
    }

    #[test]
    fn test_deadhead_floors() {
        // 13 m at factor 1.0 is exactly one second, 12.99 m is not
        assert_eq!(deadhead_seconds(13.0, 1.0, 13.0), 1);
        assert_eq!(deadhead_seconds(12.99, 1.0, 13.0), 0);
    }

    #[test]
    fn test_deadhead_zero_distance() {
        assert_eq!(deadhead_seconds(0.0, 1.536, 13.0), 0);
    }

    #[test]
    fn test_nearest_in_tier_sorted() {
        let directory = SchoolDirectory::new(vec![
            school("FAR", 2, 35.5, -80.0),
            school("NEAR", 2, 35.01, -80.0),
            school("OTHER", 3, 35.0, -80.0),
        ]);
        let from = Coordinates { lat: 35.0, lng: -80.0 };

        let ranked = directory.nearest_in_tier(&from, 2);
        let codes: Vec<&str> = ranked.iter().map(|d| d.school.as_str()).collect();
        assert_eq!(codes, vec!["NEAR", "FAR"]);
        assert!(ranked[0].distance_m < ranked[1].distance_m);
    }

    #[test]
    fn test_ranked_from_tags_tiers() {
        let directory = SchoolDirectory::new(vec![
            school("T2", 2, 35.2, -80.0),
            school("T3", 3, 35.1, -80.0),
            school("T1", 1, 35.0, -80.0),
        ]);
        let from = Coordinates { lat: 35.0, lng: -80.0 };

        let ranked = directory.ranked_from(&from, |tier| tier >= 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].school, "T3");
        assert_eq!(ranked[0].tier, 3);
        assert_eq!(ranked[1].tier, 2);
    }

    #[test]
    fn test_ties_keep_table_order() {
        let directory = SchoolDirectory::new(vec![
            school("A", 2, 35.1, -80.0),
            school("B", 2, 35.1, -80.0),
        ]);
        let from = Coordinates { lat: 35.0, lng: -80.0 };
        let ranked = directory.nearest_in_tier(&from, 2);
        assert_eq!(ranked[0].school, "A");
        assert_eq!(ranked[1].school, "B");
    }
}
