//! Game clock - advances a `GameState` to a new timestamp
//!
//! Per settlement, in order:
//! 1. accrue production for `now - last_tick` into the uncollected buffer
//! 2. apply finished upgrades and training batches
//! 3. step expeditions through their timed transitions
//! 4. move `last_tick` forward
//!
//! Production for the elapsed interval uses the levels held at the start
//! of the tick. Upgrades finishing inside the interval are not backdated.

use serde::{Deserialize, Serialize};

use crate::campaign::battle::BattleResolver;
use crate::campaign::expedition::ExpeditionStatus;
use crate::city::building::BuildingType;
use crate::city::construction;
use crate::city::production;
use crate::city::resource::Amounts;
use crate::core::types::{elapsed_seconds, ExpeditionId, SettlementId, Timestamp};
use crate::military::training;
use crate::military::unit::{Army, UnitType};
use crate::simulation::state::GameState;

/// Things that happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ResourcesAccrued {
        settlement: SettlementId,
        amounts: Amounts,
    },
    UpgradeCompleted {
        settlement: SettlementId,
        building: BuildingType,
        level: u32,
    },
    TrainingCompleted {
        settlement: SettlementId,
        unit: UnitType,
        quantity: u32,
    },
    ExpeditionArrived {
        id: ExpeditionId,
    },
    ExpeditionReturning {
        id: ExpeditionId,
        loot: Amounts,
    },
    ExpeditionCompleted {
        id: ExpeditionId,
        loot: Amounts,
        losses: Army,
    },
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

/// Stateless tick driver with an optional battle resolver
#[derive(Default)]
pub struct GameClock {
    resolver: Option<Box<dyn BattleResolver>>,
}

impl std::fmt::Debug for GameClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClock")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_resolver(&mut self, resolver: Option<Box<dyn BattleResolver>>) {
        self.resolver = resolver;
    }

    /// Produce the state at `now`. The input is left untouched.
    pub fn tick(&self, state: &GameState, now: Timestamp) -> TickReport {
        let mut next = state.clone();
        let mut events = Vec::new();

        for (id, settlement) in next.settlements.iter_mut() {
            let elapsed = elapsed_seconds(settlement.last_tick, now);
            let gained = production::accrue(&settlement.hourly_yield(), elapsed);
            if !gained.is_zero() {
                settlement.ledger.credit_uncollected(&gained);
                events.push(GameEvent::ResourcesAccrued {
                    settlement: *id,
                    amounts: gained,
                });
            }

            for (building, level) in construction::resolve_completed(settlement, now) {
                tracing::debug!("{} finished {} level {}", id, building, level);
                events.push(GameEvent::UpgradeCompleted {
                    settlement: *id,
                    building,
                    level,
                });
            }
            for order in training::resolve_completed(settlement, now) {
                tracing::debug!("{} trained {} {}", id, order.quantity, order.unit);
                events.push(GameEvent::TrainingCompleted {
                    settlement: *id,
                    unit: order.unit,
                    quantity: order.quantity,
                });
            }
        }

        let resolver = self.resolver.as_deref();
        let mut finished = Vec::new();
        for (id, expedition) in next.expeditions.iter_mut() {
            for status in expedition.advance(now, resolver) {
                match status {
                    ExpeditionStatus::Arrived => {
                        events.push(GameEvent::ExpeditionArrived { id: *id });
                    }
                    ExpeditionStatus::Returning => {
                        events.push(GameEvent::ExpeditionReturning {
                            id: *id,
                            loot: expedition.loot.unwrap_or_default(),
                        });
                    }
                    ExpeditionStatus::Completed => finished.push(*id),
                    _ => {}
                }
            }
        }

        for id in finished {
            let Some(expedition) = next.expeditions.remove(&id) else {
                continue;
            };
            let loot = expedition.loot.unwrap_or_default();
            match next.settlements.get_mut(&expedition.origin_settlement) {
                Some(home) => {
                    home.ledger.credit_uncollected(&loot);
                    home.apply_losses(&expedition.losses);
                }
                None => tracing::warn!(
                    "{} returned to missing {}",
                    id,
                    expedition.origin_settlement
                ),
            }
            events.push(GameEvent::ExpeditionCompleted {
                id,
                loot,
                losses: expedition.losses.clone(),
            });
            next.archive_expedition(expedition);
        }

        for settlement in next.settlements.values_mut() {
            settlement.last_tick = settlement.last_tick.max(now);
        }
        next.now = next.now.max(now);

        TickReport {
            state: next,
            events,
        }
    }
}

/// Advance `state` to `now` with no battle resolver
pub fn tick(state: &GameState, now: Timestamp) -> TickReport {
    GameClock::new().tick(state, now)
}
