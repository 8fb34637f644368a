//! Settlement - the player's base: ledger, buildings, army and training orders

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::city::building::{BuildingState, BuildingType};
use crate::city::ledger::Ledger;
use crate::city::production;
use crate::city::resource::Amounts;
use crate::core::types::{SettlementId, TileCoord, Timestamp};
use crate::military::training::TrainingOrder;
use crate::military::unit::{army_population, Army, UnitType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub name: String,
    pub coord: TileCoord,
    pub ledger: Ledger,
    pub buildings: BTreeMap<BuildingType, BuildingState>,
    /// Living units at home or out on expeditions
    pub army: Army,
    pub training: Vec<TrainingOrder>,
    pub last_tick: Timestamp,
}

impl Settlement {
    /// A fresh settlement with every building at level 0
    pub fn new(id: SettlementId, name: String, coord: TileCoord, now: Timestamp) -> Self {
        let buildings = BuildingType::ALL
            .into_iter()
            .map(|b| (b, BuildingState::default()))
            .collect();
        let mut settlement = Self {
            id,
            name,
            coord,
            ledger: Ledger::new(0.0, 0),
            buildings,
            army: Army::new(),
            training: Vec::new(),
            last_tick: now,
        };
        settlement.refresh_capacities();
        settlement
    }

    /// Set a building level, clamped to the building's maximum
    pub fn with_building_level(mut self, building: BuildingType, level: u32) -> Self {
        let level = level.min(building.max_level());
        self.buildings.insert(building, BuildingState::at_level(level));
        self.refresh_capacities();
        self
    }

    pub fn with_stored(mut self, stored: Amounts) -> Self {
        let population = self.ledger.population_used();
        self.ledger.stored = stored;
        self.ledger.set_population_used(population);
        self
    }

    pub fn with_units(mut self, unit: UnitType, count: u32) -> Self {
        *self.army.entry(unit).or_insert(0) += count;
        self.refresh_capacities();
        self
    }

    pub fn building(&self, building: BuildingType) -> BuildingState {
        self.buildings.get(&building).copied().unwrap_or_default()
    }

    pub fn level(&self, building: BuildingType) -> u32 {
        self.building(building).level
    }

    pub fn units(&self, unit: UnitType) -> u32 {
        self.army.get(&unit).copied().unwrap_or(0)
    }

    pub fn hourly_yield(&self) -> Amounts {
        production::hourly_yield(self.buildings.iter().map(|(b, s)| (*b, s.level)))
    }

    /// Housing taken by the standing army plus every batch in training
    pub fn population_used(&self) -> u32 {
        self.training
            .iter()
            .fold(army_population(&self.army), |total, o| total.saturating_add(o.population()))
    }

    /// Recompute storage and population caps from building levels
    pub fn refresh_capacities(&mut self) {
        self.ledger.storage_capacity = production::storage_capacity(self.level(BuildingType::Storage));
        self.ledger.population_cap = production::population_capacity(
            self.level(BuildingType::Housing),
            self.level(BuildingType::Farm),
        );
        let used = self.population_used();
        self.ledger.set_population_used(used);
    }

    /// Remove units lost abroad, never below zero
    pub fn apply_losses(&mut self, losses: &Army) {
        for (unit, lost) in losses {
            if let Some(count) = self.army.get_mut(unit) {
                *count = count.saturating_sub(*lost);
            }
        }
        self.army.retain(|_, count| *count > 0);
        self.refresh_capacities();
    }
}
