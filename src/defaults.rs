use chrono::NaiveTime;

pub const DEFAULT_FLEET_SIZE: usize = 97;
pub const DEFAULT_BUS_CAPACITY: u32 = 54;

/// 45 minutes between dismissal tiers
pub const DEFAULT_MAX_ROUTE_SECONDS: u64 = 2700;

/// Stops with at most this many riders take the base service time
pub const DEFAULT_SERVICE_RIDER_THRESHOLD: u32 = 5;
pub const DEFAULT_SERVICE_BASE_SECONDS: u64 = 60;
pub const DEFAULT_SERVICE_SECONDS_PER_RIDER: u64 = 10;

/// Straight-line to road distance correction
pub const DEFAULT_ROAD_FACTOR: f64 = 1.536;
/// Average bus speed in meters per second
pub const DEFAULT_BUS_SPEED_MPS: f64 = 13.0;

pub const DEFAULT_SOLVER_MAX_SECONDS: u32 = 100;
pub const DEFAULT_SOLVER_MAX_GENERATIONS: usize = 3000;

pub const DEFAULT_OUTPUT_FILE: &str = "bus_assignments.csv";
pub const SCHOOL_LOCATIONS_FILE: &str = "school_locations.csv";

pub fn default_dismissal_time() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN)
}
