//! Engine configuration loaded from TOML
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Building, unit and resource names are matched leniently; names the
//! engine does not know are skipped with a warning rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::city::building::BuildingType;
use crate::city::resource::{Amounts, ResourceType};
use crate::city::settlement::Settlement;
use crate::core::error::{GameError, Result};
use crate::core::types::{SettlementId, TileCoord, Timestamp};
use crate::military::unit::UnitType;

/// Starting settlement description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Stored goods keyed by resource name
    pub resources: BTreeMap<String, f64>,
    /// Starting levels keyed by building name
    pub buildings: BTreeMap<String, u32>,
    /// Standing army keyed by unit name
    pub army: BTreeMap<String, u32>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        let resources = [("wood", 500.0), ("clay", 500.0), ("iron", 300.0), ("bread", 100.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let buildings = [
            ("headquarters", 1),
            ("woodcutter", 1),
            ("clay_pit", 1),
            ("iron_mine", 1),
            ("farm", 1),
            ("storage", 1),
            ("housing", 1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            name: "Homestead".to_string(),
            x: 8,
            y: 8,
            resources,
            buildings,
            army: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub settlement: SettlementConfig,
    /// Timestamp the game starts at
    pub epoch: Timestamp,
    /// Recommended real-time spacing between ticks, in milliseconds
    pub tick_interval_ms: u64,
    /// Completed expeditions kept for queries
    pub archive_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settlement: SettlementConfig::default(),
            epoch: 0,
            tick_interval_ms: 1_000,
            archive_limit: 50,
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a configuration string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.settlement.name.trim().is_empty() {
            return Err(GameError::Config("settlement name must not be empty".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::Config("tick_interval_ms must be positive".into()));
        }
        if self.archive_limit == 0 {
            return Err(GameError::Config("archive_limit must be positive".into()));
        }
        if let Some((name, value)) = self
            .settlement
            .resources
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(GameError::Config(format!(
                "resource '{}' has invalid amount {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Starting levels for recognised buildings
    pub fn building_levels(&self) -> Vec<(BuildingType, u32)> {
        self.settlement
            .buildings
            .iter()
            .filter_map(|(name, level)| match name.parse::<BuildingType>() {
                Ok(building) => Some((building, *level)),
                Err(e) => {
                    tracing::warn!("Ignoring starting building: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Starting stock for recognised, collectable resources
    pub fn starting_resources(&self) -> Amounts {
        let mut stored = Amounts::zero();
        for (name, amount) in &self.settlement.resources {
            match name.parse::<ResourceType>() {
                Ok(resource) if resource.is_collectable() => stored[resource] += *amount,
                Ok(resource) => {
                    tracing::warn!("Ignoring starting {}: derived from the army", resource)
                }
                Err(e) => tracing::warn!("Ignoring starting resource: {}", e),
            }
        }
        stored
    }

    /// Starting army for recognised unit types
    pub fn starting_army(&self) -> Vec<(UnitType, u32)> {
        self.settlement
            .army
            .iter()
            .filter_map(|(name, count)| match name.parse::<UnitType>() {
                Ok(unit) => Some((unit, *count)),
                Err(e) => {
                    tracing::warn!("Ignoring starting unit: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Assemble the starting settlement
    ///
    /// Starting stock must fit the storage its buildings provide, and the
    /// starting army must fit its housing.
    pub fn build_settlement(&self, id: SettlementId) -> Result<Settlement> {
        let coord = TileCoord::new(self.settlement.x, self.settlement.y);
        let mut settlement = Settlement::new(id, self.settlement.name.clone(), coord, self.epoch);
        for (building, level) in self.building_levels() {
            settlement = settlement.with_building_level(building, level);
        }
        for (unit, count) in self.starting_army() {
            settlement = settlement.with_units(unit, count);
        }
        let settlement = settlement.with_stored(self.starting_resources());

        let ledger = &settlement.ledger;
        if let Some((resource, amount)) = ResourceType::goods()
            .map(|r| (r, ledger.stored[r]))
            .find(|(_, amount)| *amount > ledger.storage_capacity)
        {
            return Err(GameError::Config(format!(
                "starting {} {} exceeds storage capacity {}",
                resource, amount, ledger.storage_capacity
            )));
        }
        if ledger.population_used() > ledger.population_cap {
            return Err(GameError::Config(format!(
                "starting army needs {} housing but only {} is available",
                ledger.population_used(),
                ledger.population_cap
            )));
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = EngineConfig::parse_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::parse_toml(
            r#"
            epoch = 5000
            archive_limit = 3

            [settlement]
            name = "Ironhold"
            x = -4

            [settlement.buildings]
            barracks = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.epoch, 5000);
        assert_eq!(config.archive_limit, 3);
        assert_eq!(config.tick_interval_ms, 1_000);
        assert_eq!(config.settlement.name, "Ironhold");
        assert_eq!(config.settlement.x, -4);
        assert_eq!(config.settlement.y, 8);
        assert_eq!(config.building_levels(), vec![(BuildingType::Barracks, 2)]);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::parse_toml("tick_interval_ms = 0"),
            Err(GameError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::parse_toml("[settlement.resources]\nwood = -1.0"),
            Err(GameError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::parse_toml("archive_limit = \"many\""),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_names_skipped() {
        let config = EngineConfig::parse_toml(
            r#"
            [settlement.resources]
            wood = 10.0
            mithril = 99.0
            population = 5.0

            [settlement.buildings]
            wizard_tower = 3
            woodcutter = 2

            [settlement.army]
            dragon = 1
            spearman = 4
            "#,
        )
        .unwrap();

        let s = config.build_settlement(SettlementId(1)).unwrap();
        assert_eq!(s.ledger.stored[ResourceType::Wood], 10.0);
        assert_eq!(s.ledger.stored.non_zero().count(), 2);
        assert_eq!(s.ledger.stored[ResourceType::Population], 4.0);
        assert_eq!(s.level(BuildingType::Woodcutter), 2);
        assert_eq!(s.units(UnitType::Spearman), 4);
        assert_eq!(s.army.len(), 1);
    }

    #[test]
    fn test_starting_stock_must_fit_storage() {
        let config = EngineConfig::parse_toml("[settlement.resources]\nwood = 50000.0").unwrap();
        assert!(matches!(
            config.build_settlement(SettlementId(1)),
            Err(GameError::Config(msg)) if msg.contains("wood")
        ));

        // Level 1 storage holds exactly 1250
        let full = EngineConfig::parse_toml("[settlement.resources]\nwood = 1250.0").unwrap();
        let s = full.build_settlement(SettlementId(1)).unwrap();
        assert_eq!(s.ledger.stored[ResourceType::Wood], s.ledger.storage_capacity);
    }

    #[test]
    fn test_starting_army_must_fit_housing() {
        let config = EngineConfig::parse_toml("[settlement.army]\ncatapult = 500").unwrap();
        assert!(matches!(
            config.build_settlement(SettlementId(1)),
            Err(GameError::Config(_))
        ));
        assert!(crate::simulation::Session::from_config(&config).is_err());

        let huge = EngineConfig::parse_toml(&format!("[settlement.army]\ncatapult = {}", u32::MAX))
            .unwrap();
        assert!(matches!(
            huge.build_settlement(SettlementId(1)),
            Err(GameError::Config(_))
        ));

        let fits = EngineConfig::parse_toml("[settlement.army]\nspearman = 52").unwrap();
        let s = fits.build_settlement(SettlementId(1)).unwrap();
        assert_eq!(s.ledger.population_used(), s.ledger.population_cap);
    }

    #[test]
    fn test_default_settlement_is_productive() {
        let s = EngineConfig::default().build_settlement(SettlementId(1)).unwrap();
        assert_eq!(s.name, "Homestead");
        assert_eq!(s.coord, TileCoord::new(8, 8));
        assert!(s.hourly_yield()[ResourceType::Wood] > 0.0);
        assert_eq!(s.ledger.storage_capacity, 1250.0);
    }
}
