//! Tabular inputs and outputs
//!
//! Directory layout under the data root:
//!
//! ```text
//! school_locations.csv
//! Tier1/Tier1_pm.csv
//! Tier1/JHS_pmDistance.csv
//! Tier1/JHS_pmRouteData.csv      (written)
//! ```

pub mod assignments;
pub mod matrix;
pub mod routes;
pub mod schools;
pub mod stops;

use std::path::PathBuf;

use crate::defaults::SCHOOL_LOCATIONS_FILE;

/// File locations of one planning data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn tier_dir(&self, tier: u8) -> PathBuf {
        self.root.join(format!("Tier{}", tier))
    }

    pub fn stops_file(&self, tier: u8) -> PathBuf {
        self.tier_dir(tier).join(format!("Tier{}_pm.csv", tier))
    }

    pub fn distance_file(&self, tier: u8, school: &str) -> PathBuf {
        self.tier_dir(tier).join(format!("{}_pmDistance.csv", school))
    }

    pub fn route_file(&self, tier: u8, school: &str) -> PathBuf {
        self.tier_dir(tier).join(format!("{}_pmRouteData.csv", school))
    }

    pub fn school_locations_file(&self) -> PathBuf {
        self.root.join(SCHOOL_LOCATIONS_FILE)
    }
}
