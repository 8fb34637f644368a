//! Building types, their growth curves and per-settlement building state

use crate::city::resource::{Amounts, ResourceType};
use crate::core::error::NotFound;
use crate::core::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upgrade time grows by this factor per target level
const UPGRADE_TIME_GROWTH: f64 = 1.2;

/// Time discount per headquarters level
const HQ_DISCOUNT_PER_LEVEL: f64 = 0.02;

/// Upgrade time never drops below this share of nominal
const MIN_TIME_FACTOR: f64 = 0.5;

/// Type of building
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Headquarters,
    Woodcutter,
    ClayPit,
    IronMine,
    CoalMine,
    Farm,
    Bakery,
    Butchery,
    Treasury,
    Storage,
    Housing,
    Barracks,
}

/// Hourly output of a producing building: `floor(base_per_level * level * growth^(level-1))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionCurve {
    pub resource: ResourceType,
    pub base_per_level: f64,
    pub growth: f64,
}

impl ProductionCurve {
    pub fn hourly_output(&self, level: u32) -> f64 {
        if level == 0 {
            return 0.0;
        }
        let base = self.base_per_level * level as f64;
        (base * self.growth.powi(level as i32 - 1)).floor()
    }
}

/// Upgrade cost: `floor(base * growth^(target_level-1))` per required resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostCurve {
    pub base: &'static [(ResourceType, f64)],
    pub growth: f64,
}

impl CostCurve {
    pub fn at_level(&self, target_level: u32) -> Amounts {
        let factor = self.growth.powi(target_level.max(1) as i32 - 1);
        let mut cost = Amounts::zero();
        for (resource, base) in self.base {
            cost[*resource] = (base * factor).floor();
        }
        cost
    }
}

impl BuildingType {
    pub const ALL: [BuildingType; 12] = [
        BuildingType::Headquarters,
        BuildingType::Woodcutter,
        BuildingType::ClayPit,
        BuildingType::IronMine,
        BuildingType::CoalMine,
        BuildingType::Farm,
        BuildingType::Bakery,
        BuildingType::Butchery,
        BuildingType::Treasury,
        BuildingType::Storage,
        BuildingType::Housing,
        BuildingType::Barracks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuildingType::Headquarters => "headquarters",
            BuildingType::Woodcutter => "woodcutter",
            BuildingType::ClayPit => "clay_pit",
            BuildingType::IronMine => "iron_mine",
            BuildingType::CoalMine => "coal_mine",
            BuildingType::Farm => "farm",
            BuildingType::Bakery => "bakery",
            BuildingType::Butchery => "butchery",
            BuildingType::Treasury => "treasury",
            BuildingType::Storage => "storage",
            BuildingType::Housing => "housing",
            BuildingType::Barracks => "barracks",
        }
    }

    pub fn max_level(&self) -> u32 {
        match self {
            BuildingType::Treasury => 10,
            _ => 20,
        }
    }

    /// Production formula, `None` for buildings that produce nothing
    pub fn production(&self) -> Option<ProductionCurve> {
        let (resource, base_per_level, growth) = match self {
            BuildingType::Woodcutter => (ResourceType::Wood, 30.0, 1.163),
            BuildingType::ClayPit => (ResourceType::Clay, 30.0, 1.163),
            BuildingType::IronMine => (ResourceType::Iron, 25.0, 1.163),
            BuildingType::CoalMine => (ResourceType::Coal, 20.0, 1.163),
            BuildingType::Farm => (ResourceType::Wheat, 35.0, 1.163),
            BuildingType::Bakery => (ResourceType::Bread, 12.0, 1.15),
            BuildingType::Butchery => (ResourceType::Meat, 12.0, 1.15),
            BuildingType::Treasury => (ResourceType::Gold, 5.0, 1.12),
            BuildingType::Headquarters
            | BuildingType::Storage
            | BuildingType::Housing
            | BuildingType::Barracks => return None,
        };
        Some(ProductionCurve {
            resource,
            base_per_level,
            growth,
        })
    }

    pub fn cost_curve(&self) -> CostCurve {
        use ResourceType::*;
        let (base, growth): (&'static [(ResourceType, f64)], f64) = match self {
            BuildingType::Headquarters => (&[(Wood, 70.0), (Clay, 40.0), (Iron, 60.0)], 1.28),
            BuildingType::Woodcutter => (&[(Wood, 40.0), (Clay, 60.0), (Iron, 25.0)], 1.26),
            BuildingType::ClayPit => (&[(Wood, 50.0), (Clay, 30.0), (Iron, 30.0)], 1.26),
            BuildingType::IronMine => (&[(Wood, 75.0), (Clay, 65.0), (Iron, 20.0)], 1.26),
            BuildingType::CoalMine => (&[(Wood, 65.0), (Clay, 50.0), (Iron, 40.0)], 1.26),
            BuildingType::Farm => (&[(Wood, 70.0), (Clay, 90.0), (Iron, 70.0)], 1.26),
            BuildingType::Bakery => (
                &[(Wood, 90.0), (Clay, 80.0), (Iron, 40.0), (Coal, 20.0)],
                1.28,
            ),
            BuildingType::Butchery => (
                &[(Wood, 80.0), (Clay, 70.0), (Iron, 60.0), (Coal, 10.0)],
                1.28,
            ),
            BuildingType::Treasury => (
                &[(Wood, 150.0), (Clay, 150.0), (Iron, 120.0), (Coal, 40.0)],
                1.3,
            ),
            BuildingType::Storage => (&[(Wood, 130.0), (Clay, 160.0), (Iron, 90.0)], 1.28),
            BuildingType::Housing => (&[(Wood, 100.0), (Clay, 80.0), (Iron, 30.0)], 1.27),
            BuildingType::Barracks => (&[(Wood, 210.0), (Clay, 140.0), (Iron, 260.0)], 1.28),
        };
        CostCurve { base, growth }
    }

    /// Nominal seconds to reach level 1
    pub fn base_upgrade_seconds(&self) -> f64 {
        match self {
            BuildingType::Headquarters => 90.0,
            BuildingType::Woodcutter | BuildingType::ClayPit | BuildingType::Farm => 60.0,
            BuildingType::IronMine | BuildingType::CoalMine => 75.0,
            BuildingType::Bakery | BuildingType::Butchery => 120.0,
            BuildingType::Treasury => 240.0,
            BuildingType::Storage => 100.0,
            BuildingType::Housing => 90.0,
            BuildingType::Barracks => 180.0,
        }
    }

    pub fn upgrade_cost(&self, target_level: u32) -> Amounts {
        self.cost_curve().at_level(target_level)
    }

    /// `floor(base * 1.2^(target-1) * max(0.5, 1 - 0.02*hq_level))`
    pub fn upgrade_duration_secs(&self, target_level: u32, hq_level: u32) -> u64 {
        let nominal =
            self.base_upgrade_seconds() * UPGRADE_TIME_GROWTH.powi(target_level.max(1) as i32 - 1);
        let discount = (1.0 - HQ_DISCOUNT_PER_LEVEL * hq_level as f64).max(MIN_TIME_FACTOR);
        (nominal * discount).floor() as u64
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildingType {
    type Err = NotFound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| NotFound::Building(s.to_string()))
    }
}

/// An upgrade that has been paid for and is waiting on the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOrder {
    pub target_level: u32,
    pub started_at: Timestamp,
    pub completes_at: Timestamp,
}

/// Current state of one building in a settlement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingState {
    pub level: u32,
    pub upgrade: Option<UpgradeOrder>,
}

impl BuildingState {
    pub fn at_level(level: u32) -> Self {
        Self {
            level,
            upgrade: None,
        }
    }

    pub fn is_upgrading(&self) -> bool {
        self.upgrade.is_some()
    }

    /// Whether the pending upgrade (if any) is still running at `now`
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.upgrade.map(|u| u.completes_at > now).unwrap_or(false)
    }
}
