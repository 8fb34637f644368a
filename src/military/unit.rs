//! Unit types - the single canonical table for cost, speed and carry values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::city::resource::{Amounts, ResourceType};
use crate::core::error::NotFound;

/// Barracks shorten training by this fraction per level
const BARRACKS_SPEED_PER_LEVEL: f64 = 0.05;

/// Unit composition of an army: unit type -> head count
pub type Army = BTreeMap<UnitType, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Spearman,
    Swordsman,
    Archer,
    Scout,
    LightCavalry,
    HeavyCavalry,
    Ram,
    Catapult,
}

impl UnitType {
    pub const ALL: [UnitType; 8] = [
        UnitType::Spearman,
        UnitType::Swordsman,
        UnitType::Archer,
        UnitType::Scout,
        UnitType::LightCavalry,
        UnitType::HeavyCavalry,
        UnitType::Ram,
        UnitType::Catapult,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UnitType::Spearman => "spearman",
            UnitType::Swordsman => "swordsman",
            UnitType::Archer => "archer",
            UnitType::Scout => "scout",
            UnitType::LightCavalry => "light_cavalry",
            UnitType::HeavyCavalry => "heavy_cavalry",
            UnitType::Ram => "ram",
            UnitType::Catapult => "catapult",
        }
    }

    /// Cost of training one unit
    pub fn cost(&self) -> Amounts {
        use ResourceType::*;
        let pairs: &[(ResourceType, f64)] = match self {
            UnitType::Spearman => &[(Wood, 50.0), (Iron, 20.0), (Bread, 10.0)],
            UnitType::Swordsman => &[(Wood, 30.0), (Iron, 70.0), (Coal, 10.0), (Bread, 10.0)],
            UnitType::Archer => &[(Wood, 60.0), (Iron, 30.0), (Bread, 10.0)],
            UnitType::Scout => &[(Wood, 20.0), (Iron, 20.0), (Meat, 10.0)],
            UnitType::LightCavalry => &[(Wood, 100.0), (Iron, 120.0), (Meat, 30.0)],
            UnitType::HeavyCavalry => &[
                (Wood, 150.0),
                (Iron, 200.0),
                (Coal, 20.0),
                (Meat, 40.0),
                (Gold, 10.0),
            ],
            UnitType::Ram => &[(Wood, 300.0), (Iron, 100.0), (Coal, 30.0)],
            UnitType::Catapult => &[(Wood, 320.0), (Iron, 150.0), (Coal, 40.0), (Gold, 15.0)],
        };
        Amounts::from_pairs(pairs)
    }

    /// Housing taken by one unit
    pub fn population_cost(&self) -> u32 {
        match self {
            UnitType::Spearman | UnitType::Swordsman | UnitType::Archer => 1,
            UnitType::Scout => 2,
            UnitType::LightCavalry => 4,
            UnitType::HeavyCavalry => 6,
            UnitType::Ram => 5,
            UnitType::Catapult => 8,
        }
    }

    /// Seconds to train one unit with no barracks bonus
    pub fn base_training_seconds(&self) -> f64 {
        match self {
            UnitType::Spearman => 90.0,
            UnitType::Swordsman => 120.0,
            UnitType::Archer => 110.0,
            UnitType::Scout => 80.0,
            UnitType::LightCavalry => 180.0,
            UnitType::HeavyCavalry => 260.0,
            UnitType::Ram => 300.0,
            UnitType::Catapult => 420.0,
        }
    }

    /// Minutes needed to cross one tile. Higher is slower.
    pub fn minutes_per_tile(&self) -> f64 {
        match self {
            UnitType::Spearman | UnitType::Archer => 18.0,
            UnitType::Swordsman => 22.0,
            UnitType::Scout => 9.0,
            UnitType::LightCavalry => 10.0,
            UnitType::HeavyCavalry => 11.0,
            UnitType::Ram | UnitType::Catapult => 30.0,
        }
    }

    /// Loot one unit can haul home
    pub fn carry_capacity(&self) -> u32 {
        match self {
            UnitType::Spearman => 25,
            UnitType::Swordsman => 15,
            UnitType::Archer => 10,
            UnitType::Scout => 0,
            UnitType::LightCavalry => 80,
            UnitType::HeavyCavalry => 50,
            UnitType::Ram | UnitType::Catapult => 0,
        }
    }

    /// `floor(base * quantity / (1 + 0.05 * barracks_level))`
    pub fn training_duration_secs(&self, quantity: u32, barracks_level: u32) -> u64 {
        let speedup = 1.0 + BARRACKS_SPEED_PER_LEVEL * barracks_level as f64;
        (self.base_training_seconds() * quantity as f64 / speedup).floor() as u64
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitType {
    type Err = NotFound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        match wanted.as_str() {
            "lightcav" => return Ok(UnitType::LightCavalry),
            "heavycav" => return Ok(UnitType::HeavyCavalry),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|u| u.name() == wanted)
            .ok_or_else(|| NotFound::Unit(s.to_string()))
    }
}

/// Housing occupied by an army
pub fn army_population(army: &Army) -> u32 {
    army.iter().fold(0u32, |total, (unit, count)| {
        total.saturating_add(unit.population_cost().saturating_mul(*count))
    })
}

/// Total head count of an army
pub fn army_size(army: &Army) -> u32 {
    army.values().fold(0u32, |total, count| total.saturating_add(*count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siege_engines_are_slowest() {
        let slowest = UnitType::ALL
            .iter()
            .map(|u| u.minutes_per_tile())
            .fold(0.0, f64::max);
        assert_eq!(UnitType::Ram.minutes_per_tile(), slowest);
        assert!(UnitType::LightCavalry.minutes_per_tile() < UnitType::Spearman.minutes_per_tile());
    }

    #[test]
    fn test_training_duration_barracks_bonus() {
        assert_eq!(UnitType::Spearman.training_duration_secs(1, 0), 90);
        assert_eq!(UnitType::Spearman.training_duration_secs(10, 0), 900);
        // 900 / 1.5 at barracks 10
        assert_eq!(UnitType::Spearman.training_duration_secs(10, 10), 600);
    }

    #[test]
    fn test_unit_cost_mixes_resources() {
        let cost = UnitType::HeavyCavalry.cost();
        assert_eq!(cost.non_zero().count(), 5);
        assert_eq!(cost[ResourceType::Gold], 10.0);
    }

    #[test]
    fn test_unit_parse_aliases() {
        assert_eq!("lightcav".parse::<UnitType>().unwrap(), UnitType::LightCavalry);
        assert_eq!("light-cavalry".parse::<UnitType>().unwrap(), UnitType::LightCavalry);
        assert_eq!("Ram".parse::<UnitType>().unwrap(), UnitType::Ram);
        assert!("dragon".parse::<UnitType>().is_err());
    }

    #[test]
    fn test_army_population() {
        let army: Army = [(UnitType::Spearman, 10), (UnitType::Ram, 2)].into_iter().collect();
        assert_eq!(army_population(&army), 20);
        assert_eq!(army_size(&army), 12);
    }
}
