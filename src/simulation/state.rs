//! Game state - everything the clock advances, as plain data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::campaign::expedition::{self, Expedition};
use crate::city::settlement::Settlement;
use crate::core::error::NotFound;
use crate::core::types::{ExpeditionId, SettlementId, Timestamp};
use crate::military::unit::Army;

fn default_archive_limit() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Latest timestamp the clock has been advanced to
    pub now: Timestamp,
    pub settlements: BTreeMap<SettlementId, Settlement>,
    /// Expeditions that have not completed
    pub expeditions: BTreeMap<ExpeditionId, Expedition>,
    /// Completed expeditions, oldest first
    pub archive: Vec<Expedition>,
    pub next_expedition_id: u32,
    #[serde(default = "default_archive_limit")]
    pub archive_limit: usize,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GameState {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            settlements: BTreeMap::new(),
            expeditions: BTreeMap::new(),
            archive: Vec::new(),
            next_expedition_id: 1,
            archive_limit: default_archive_limit(),
        }
    }

    pub fn with_settlement(mut self, settlement: Settlement) -> Self {
        self.settlements.insert(settlement.id, settlement);
        self
    }

    pub fn with_archive_limit(mut self, limit: usize) -> Self {
        self.archive_limit = limit.max(1);
        self
    }

    pub fn settlement(&self, id: SettlementId) -> Result<&Settlement, NotFound> {
        self.settlements.get(&id).ok_or(NotFound::Settlement(id))
    }

    pub fn settlement_mut(&mut self, id: SettlementId) -> Result<&mut Settlement, NotFound> {
        self.settlements.get_mut(&id).ok_or(NotFound::Settlement(id))
    }

    pub fn expedition(&self, id: ExpeditionId) -> Result<&Expedition, NotFound> {
        self.expeditions.get(&id).ok_or(NotFound::Expedition(id))
    }

    pub fn expedition_mut(&mut self, id: ExpeditionId) -> Result<&mut Expedition, NotFound> {
        self.expeditions.get_mut(&id).ok_or(NotFound::Expedition(id))
    }

    pub fn allocate_expedition_id(&mut self) -> ExpeditionId {
        let id = ExpeditionId(self.next_expedition_id);
        self.next_expedition_id += 1;
        id
    }

    /// Units of a settlement that are home and not promised to an expedition
    pub fn available_army(&self, id: SettlementId) -> Result<Army, NotFound> {
        let settlement = self.settlement(id)?;
        let reserved = expedition::reserved_units(self.expeditions.values(), id);
        Ok(expedition::available_army(settlement, &reserved))
    }

    /// Keep a finished expedition, dropping the oldest beyond the limit
    pub fn archive_expedition(&mut self, expedition: Expedition) {
        self.archive.push(expedition);
        let limit = self.archive_limit.max(1);
        if self.archive.len() > limit {
            let excess = self.archive.len() - limit;
            self.archive.drain(..excess);
        }
    }
}
