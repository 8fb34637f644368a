//! Session - the single writer over a `GameState`
//!
//! Commands run against a copy of the committed state and replace it only
//! when they succeed, so a rejected command never leaves partial changes.
//! Queries hand back owned snapshots.

use crate::campaign::battle::{BattleOutcome, BattleResolver};
use crate::campaign::expedition::{self, Expedition, ExpeditionRequest, ExpeditionStatus};
use crate::campaign::worldgen::{ChunkCoord, GeneratedSettlement, WorldMap};
use crate::city::building::{BuildingType, UpgradeOrder};
use crate::city::construction;
use crate::city::resource::{Amounts, ResourceType};
use crate::city::settlement::Settlement;
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, NotFound, Result};
use crate::core::types::{ExpeditionId, SettlementId, TileCoord, Timestamp};
use crate::military::training::{self, TrainingOrder};
use crate::military::unit::UnitType;
use crate::simulation::clock::{GameClock, GameEvent};
use crate::simulation::state::GameState;

/// Id given to the configured starting settlement
pub const HOME_SETTLEMENT: SettlementId = SettlementId(1);

#[derive(Debug, Default)]
pub struct Session {
    state: GameState,
    clock: GameClock,
    world: WorldMap,
}

impl Session {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            clock: GameClock::new(),
            world: WorldMap::new(),
        }
    }

    /// Start a game from configuration with one home settlement
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let home = config.build_settlement(HOME_SETTLEMENT)?;
        tracing::info!("New game: {} at {}", home.name, home.coord);
        let state = GameState::new(config.epoch)
            .with_archive_limit(config.archive_limit)
            .with_settlement(home);
        Ok(Self::new(state))
    }

    pub fn with_resolver(mut self, resolver: Box<dyn BattleResolver>) -> Self {
        self.clock.set_resolver(Some(resolver));
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn now(&self) -> Timestamp {
        self.state.now
    }

    /// Validate and apply `change` on a working copy, committing on success
    fn commit<T, F>(&mut self, action: &str, change: F) -> Result<T>
    where
        F: FnOnce(&mut GameState, &mut WorldMap) -> Result<T>,
    {
        let mut working = self.state.clone();
        match change(&mut working, &mut self.world) {
            Ok(value) => {
                self.state = working;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("Rejected {}: {}", action, e);
                Err(e)
            }
        }
    }

    // === Commands ===

    pub fn start_upgrade(
        &mut self,
        settlement: SettlementId,
        building: BuildingType,
    ) -> Result<UpgradeOrder> {
        let now = self.state.now;
        let order = self.commit("upgrade", |state, _| {
            let s = state.settlement_mut(settlement)?;
            Ok(construction::start_upgrade(s, building, now)?)
        })?;
        tracing::info!(
            "{}: {} -> level {} at {}",
            settlement,
            building,
            order.target_level,
            order.completes_at
        );
        Ok(order)
    }

    pub fn start_training(
        &mut self,
        settlement: SettlementId,
        unit: UnitType,
        quantity: u32,
    ) -> Result<TrainingOrder> {
        let now = self.state.now;
        let order = self.commit("training", |state, _| {
            let s = state.settlement_mut(settlement)?;
            Ok(training::start_training(s, unit, quantity, now)?)
        })?;
        tracing::info!(
            "{}: training {} {} until {}",
            settlement,
            quantity,
            unit,
            order.completes_at
        );
        Ok(order)
    }

    /// Move uncollected goods into storage. `None` collects every good.
    pub fn collect_resources(
        &mut self,
        settlement: SettlementId,
        resource: Option<ResourceType>,
    ) -> Result<Amounts> {
        let collected = self.commit("collect", |state, _| {
            let s = state.settlement_mut(settlement)?;
            Ok(s.ledger.collect(resource)?)
        })?;
        tracing::info!("{}: collected {}", settlement, collected);
        Ok(collected)
    }

    pub fn create_expedition(
        &mut self,
        settlement: SettlementId,
        request: ExpeditionRequest,
    ) -> Result<Expedition> {
        let now = self.state.now;
        let planned = self.commit("expedition", |state, world| {
            let available = state.available_army(settlement)?;
            let origin = state.settlement(settlement)?;
            let id = ExpeditionId(state.next_expedition_id);
            let planned = expedition::plan(id, origin, &available, &request, now, world)?;
            state.allocate_expedition_id();
            state.expeditions.insert(id, planned.clone());
            Ok(planned)
        })?;
        tracing::info!(
            "{}: {} planned to {} ({} tiles, {} min)",
            planned.id,
            planned.kind,
            planned.target.info.name,
            planned.distance.round(),
            planned.travel_minutes
        );
        Ok(planned)
    }

    pub fn confirm_expedition(&mut self, id: ExpeditionId) -> Result<()> {
        self.commit("confirm", |state, _| {
            Ok(state.expedition_mut(id)?.confirm()?)
        })?;
        tracing::info!("{} marching", id);
        Ok(())
    }

    /// Drop an expedition still in planning. Nothing is refunded.
    pub fn cancel_expedition(&mut self, id: ExpeditionId) -> Result<()> {
        self.commit("cancel", |state, _| {
            state.expedition_mut(id)?.cancel()?;
            state.expeditions.remove(&id);
            Ok(())
        })?;
        tracing::info!("{} cancelled", id);
        Ok(())
    }

    /// Hand in the result of a fight for an arrived expedition
    pub fn attach_outcome(&mut self, id: ExpeditionId, outcome: BattleOutcome) -> Result<()> {
        let now = self.state.now;
        self.commit("outcome", |state, _| {
            Ok(state.expedition_mut(id)?.attach_outcome(outcome, now)?)
        })?;
        tracing::info!("{} returning", id);
        Ok(())
    }

    /// Advance the clock. A `now` behind the current time changes nothing.
    pub fn tick(&mut self, now: Timestamp) -> Vec<GameEvent> {
        let report = self.clock.tick(&self.state, now);
        self.state = report.state;
        for event in &report.events {
            tracing::debug!("{:?}", event);
        }
        report.events
    }

    // === Queries ===

    pub fn settlement(&self, id: SettlementId) -> Result<Settlement> {
        Ok(self.state.settlement(id)?.clone())
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.state.settlements.values().cloned().collect()
    }

    pub fn construction_queue(
        &self,
        id: SettlementId,
    ) -> Result<Vec<(BuildingType, UpgradeOrder)>> {
        Ok(construction::pending(self.state.settlement(id)?))
    }

    pub fn training_queue(&self, id: SettlementId) -> Result<Vec<TrainingOrder>> {
        Ok(training::pending(self.state.settlement(id)?))
    }

    /// Active and archived expeditions, optionally of one status
    pub fn expeditions(&self, status: Option<ExpeditionStatus>) -> Vec<Expedition> {
        self.state
            .expeditions
            .values()
            .chain(self.state.archive.iter())
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect()
    }

    pub fn expedition(&self, id: ExpeditionId) -> Result<Expedition> {
        if let Ok(active) = self.state.expedition(id) {
            return Ok(active.clone());
        }
        self.state
            .archive
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| NotFound::Expedition(id).into())
    }

    /// Generated settlements in the inclusive chunk rectangle
    pub fn world_chunks(&mut self, min: ChunkCoord, max: ChunkCoord) -> Vec<GeneratedSettlement> {
        self.world.range(min, max)
    }

    pub fn world_around(&mut self, center: TileCoord, radius: i32) -> Vec<GeneratedSettlement> {
        self.world.around(center, radius)
    }

    // === Snapshots ===

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    pub fn import_json(json: &str) -> Result<Self> {
        let state: GameState = serde_json::from_str(json)?;
        Ok(Self::new(state))
    }
}
