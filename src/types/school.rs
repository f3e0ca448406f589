//! School and dismissal tier types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::error::{PlannerError, PlannerResult};

/// A school location with its dismissal tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub code: String,
    pub coordinates: Coordinates,
    /// 1-based dismissal tier
    pub tier: u8,
    pub depot_capacity: Option<u32>,
}

/// Schools sharing one dismissal wave, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub number: u8,
    pub schools: Vec<String>,
}

/// Ordered dismissal tiers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TierPlan {
    tiers: Vec<Tier>,
}

impl TierPlan {
    /// Build from explicit school lists; the first list is tier 1.
    pub fn new(groups: Vec<Vec<String>>) -> PlannerResult<Self> {
        let mut tiers = Vec::with_capacity(groups.len());
        for (index, schools) in groups.into_iter().enumerate() {
            if schools.is_empty() {
                return Err(PlannerError::configuration(format!(
                    "tier {} has no schools",
                    index + 1
                )));
            }
            let number = u8::try_from(index + 1).map_err(|_| {
                PlannerError::configuration(format!("at most {} tiers are supported", u8::MAX))
            })?;
            tiers.push(Tier { number, schools });
        }
        let plan = Self { tiers };
        plan.check_unique()?;
        Ok(plan)
    }

    /// Parse `A,B;C,D;E` into three tiers.
    pub fn parse(value: &str) -> PlannerResult<Self> {
        let groups = value
            .split(';')
            .map(|group| {
                group
                    .split(',')
                    .map(|code| code.trim().to_string())
                    .filter(|code| !code.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();
        Self::new(groups)
    }

    /// Group school locations by their tier column, keeping file order inside a tier.
    pub fn from_schools(schools: &[School]) -> PlannerResult<Self> {
        let mut by_tier: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        for school in schools {
            if school.tier == 0 {
                return Err(PlannerError::configuration(format!(
                    "school {} has tier 0; tiers start at 1",
                    school.code
                )));
            }
            by_tier.entry(school.tier).or_default().push(school.code.clone());
        }

        let mut expected = 1u8;
        for &number in by_tier.keys() {
            if number != expected {
                return Err(PlannerError::configuration(format!(
                    "tier numbers must be contiguous from 1, missing tier {}",
                    expected
                )));
            }
            expected += 1;
        }

        Self::new(by_tier.into_values().collect())
    }

    fn check_unique(&self) -> PlannerResult<()> {
        let mut seen = std::collections::HashSet::new();
        for tier in &self.tiers {
            for school in &tier.schools {
                if !seen.insert(school.as_str()) {
                    return Err(PlannerError::configuration(format!(
                        "school {} appears in more than one tier",
                        school
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn tier(&self, number: u8) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.number == number)
    }

    /// Tier number a school dismisses in, if it is planned at all
    pub fn tier_of(&self, school: &str) -> Option<u8> {
        self.tiers
            .iter()
            .find(|t| t.schools.iter().any(|s| s == school))
            .map(|t| t.number)
    }

    pub fn schools(&self) -> impl Iterator<Item = &str> {
        self.tiers
            .iter()
            .flat_map(|t| t.schools.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(code: &str, tier: u8) -> School {
        School {
            code: code.to_string(),
            coordinates: Coordinates { lat: 35.0, lng: -80.0 },
            tier,
            depot_capacity: None,
        }
    }

    #[test]
    fn test_parse_three_tiers() {
        let plan = TierPlan::parse("JHS,LHS;HMS, JBM;MAT").unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.tiers()[1].schools, vec!["HMS", "JBM"]);
        assert_eq!(plan.tier_of("MAT"), Some(3));
        assert_eq!(plan.tier_of("XYZ"), None);
    }

    #[test]
    fn test_parse_rejects_empty_tier() {
        assert!(TierPlan::parse("JHS;;MAT").is_err());
    }

    #[test]
    fn test_more_than_255_tiers_rejected() {
        let groups = (0..256).map(|i| vec![format!("S{}", i)]).collect();
        let err = TierPlan::new(groups).unwrap_err();
        assert!(matches!(err, PlannerError::Configuration(_)));

        let groups = (0..255).map(|i| vec![format!("S{}", i)]).collect();
        assert_eq!(TierPlan::new(groups).unwrap().len(), 255);
    }

    #[test]
    fn test_duplicate_school_rejected() {
        assert!(TierPlan::parse("JHS;JHS").is_err());
    }

    #[test]
    fn test_from_schools_groups_in_file_order() {
        let schools = vec![
            school("HMS", 2),
            school("JHS", 1),
            school("MAT", 3),
            school("LHS", 1),
        ];
        let plan = TierPlan::from_schools(&schools).unwrap();
        assert_eq!(plan.tiers()[0].schools, vec!["JHS", "LHS"]);
        assert_eq!(plan.tiers()[1].schools, vec!["HMS"]);
        assert_eq!(plan.tier(3).map(|t| t.schools.len()), Some(1));
    }

    #[test]
    fn test_from_schools_requires_contiguous_tiers() {
        let schools = vec![school("JHS", 1), school("MAT", 3)];
        assert!(TierPlan::from_schools(&schools).is_err());
    }

    #[test]
    fn test_schools_iterates_all_tiers() {
        let plan = TierPlan::parse("A,B;C").unwrap();
        assert_eq!(plan.schools().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }
}
