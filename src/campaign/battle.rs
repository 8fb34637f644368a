//! Battle outcomes for expeditions
//!
//! No combat model lives in this crate. Whatever decides a fight plugs in
//! through `BattleResolver` or hands its outcome to the session directly.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::campaign::expedition::Expedition;
use crate::city::resource::Amounts;
use crate::core::types::ExpeditionId;
use crate::military::unit::Army;

/// What came back from a fight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Goods taken, before the carry cap is applied
    pub loot: Amounts,
    /// Units that did not survive
    pub losses: Army,
}

impl BattleOutcome {
    pub fn new(loot: Amounts, losses: Army) -> Self {
        Self { loot, losses }
    }

    /// An uncontested arrival: nothing taken, nobody lost
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Supplies outcomes for expeditions that have reached their target
pub trait BattleResolver {
    /// `None` leaves the expedition waiting at its target
    fn resolve_battle(&self, expedition: &Expedition) -> Option<BattleOutcome>;
}

/// Replays outcomes registered ahead of time, keyed by expedition
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    outcomes: AHashMap<ExpeditionId, BattleOutcome>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(mut self, id: ExpeditionId, outcome: BattleOutcome) -> Self {
        self.outcomes.insert(id, outcome);
        self
    }
}

impl BattleResolver for ScriptedResolver {
    fn resolve_battle(&self, expedition: &Expedition) -> Option<BattleOutcome> {
        self.outcomes.get(&expedition.id).cloned()
    }
}
