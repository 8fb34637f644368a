//! Training queue - slot-limited unit batches
//!
//! Works like the construction queue but keyed by unit type and barracks
//! level, and every batch must also fit under the population cap.

use serde::{Deserialize, Serialize};

use crate::city::building::BuildingType;
use crate::city::construction::slot_capacity;
use crate::city::resource::Amounts;
use crate::city::settlement::Settlement;
use crate::core::error::{CommandRejection, QueueKind};
use crate::core::types::{Timestamp, MILLIS_PER_SECOND};
use crate::military::unit::UnitType;

/// A paid-for batch of units waiting on the clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOrder {
    pub unit: UnitType,
    pub quantity: u32,
    pub cost: Amounts,
    pub started_at: Timestamp,
    pub completes_at: Timestamp,
    /// Barracks slot the batch occupies
    pub slot: usize,
}

impl TrainingOrder {
    pub fn population(&self) -> u32 {
        self.unit.population_cost().saturating_mul(self.quantity)
    }
}

/// A validated batch, not yet applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingPlan {
    pub unit: UnitType,
    pub quantity: u32,
    pub cost: Amounts,
    pub duration_secs: u64,
    pub slot: usize,
}

/// Lowest slot index not held by an order
fn free_slot(settlement: &Settlement, capacity: usize) -> Option<usize> {
    (0..capacity).find(|slot| !settlement.training.iter().any(|o| o.slot == *slot))
}

pub fn check_training(
    settlement: &Settlement,
    unit: UnitType,
    quantity: u32,
) -> Result<TrainingPlan, CommandRejection> {
    if quantity == 0 {
        return Err(CommandRejection::ZeroQuantity);
    }
    let barracks_level = settlement.level(BuildingType::Barracks);
    if barracks_level == 0 {
        return Err(CommandRejection::BarracksRequired);
    }

    let capacity = slot_capacity(barracks_level);
    let slot = free_slot(settlement, capacity).ok_or(CommandRejection::NoFreeSlot {
        queue: QueueKind::Training,
        capacity,
    })?;

    let required = unit.population_cost().saturating_mul(quantity);
    let available = settlement
        .ledger
        .population_cap
        .saturating_sub(settlement.population_used());
    if required > available {
        return Err(CommandRejection::PopulationCapExceeded {
            required,
            available,
        });
    }

    let cost = unit.cost() * quantity as f64;
    settlement.ledger.check_affordable(&cost)?;

    Ok(TrainingPlan {
        unit,
        quantity,
        cost,
        duration_secs: unit.training_duration_secs(quantity, barracks_level),
        slot,
    })
}

pub fn can_start(settlement: &Settlement, unit: UnitType, quantity: u32) -> bool {
    check_training(settlement, unit, quantity).is_ok()
}

/// Pay for a batch and put it in a free barracks slot
pub fn start_training(
    settlement: &mut Settlement,
    unit: UnitType,
    quantity: u32,
    now: Timestamp,
) -> Result<TrainingOrder, CommandRejection> {
    let plan = check_training(settlement, unit, quantity)?;
    settlement.ledger.spend(&plan.cost)?;

    let order = TrainingOrder {
        unit,
        quantity,
        cost: plan.cost,
        started_at: now,
        completes_at: now.saturating_add(plan.duration_secs.saturating_mul(MILLIS_PER_SECOND)),
        slot: plan.slot,
    };
    settlement.training.push(order.clone());
    settlement.refresh_capacities();
    Ok(order)
}

/// Move finished batches into the army
pub fn resolve_completed(settlement: &mut Settlement, now: Timestamp) -> Vec<TrainingOrder> {
    let (done, running): (Vec<_>, Vec<_>) = settlement
        .training
        .drain(..)
        .partition(|o| o.completes_at <= now);
    settlement.training = running;

    for order in &done {
        *settlement.army.entry(order.unit).or_insert(0) += order.quantity;
    }
    if !done.is_empty() {
        settlement.refresh_capacities();
    }
    done
}

/// Orders sorted by completion time
pub fn pending(settlement: &Settlement) -> Vec<TrainingOrder> {
    let mut orders = settlement.training.clone();
    orders.sort_by_key(|o| (o.completes_at, o.slot));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::resource::ResourceType;
    use crate::core::types::{SettlementId, TileCoord};

    fn garrison() -> Settlement {
        Settlement::new(SettlementId(1), "Ashford".into(), TileCoord::new(0, 0), 0)
            .with_building_level(BuildingType::Barracks, 1)
            .with_building_level(BuildingType::Housing, 5)
            .with_building_level(BuildingType::Farm, 5)
            .with_stored(Amounts::from_pairs(&[
                (ResourceType::Wood, 5000.0),
                (ResourceType::Iron, 5000.0),
                (ResourceType::Coal, 500.0),
                (ResourceType::Bread, 500.0),
                (ResourceType::Meat, 500.0),
            ]))
    }

    #[test]
    fn test_start_training_charges_batch() {
        let mut s = garrison();
        let order = start_training(&mut s, UnitType::Spearman, 10, 1_000).unwrap();

        assert_eq!(order.slot, 0);
        // 900s / 1.05
        assert_eq!(order.completes_at, 1_000 + 857_000);
        assert_eq!(s.ledger.stored[ResourceType::Wood], 4500.0);
        assert_eq!(s.ledger.stored[ResourceType::Bread], 400.0);
        assert_eq!(s.population_used(), 10);
    }

    #[test]
    fn test_barracks_required() {
        let s = garrison().with_building_level(BuildingType::Barracks, 0);
        assert_eq!(
            check_training(&s, UnitType::Archer, 1),
            Err(CommandRejection::BarracksRequired)
        );
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert_eq!(
            check_training(&garrison(), UnitType::Archer, 0),
            Err(CommandRejection::ZeroQuantity)
        );
    }

    #[test]
    fn test_population_cap_enforced() {
        let s = garrison();
        let cap = s.ledger.population_cap;
        let err = check_training(&s, UnitType::Spearman, cap + 1).unwrap_err();
        assert_eq!(
            err,
            CommandRejection::PopulationCapExceeded {
                required: cap + 1,
                available: cap
            }
        );
    }

    #[test]
    fn test_training_slots_limited() {
        let mut s = garrison();
        start_training(&mut s, UnitType::Spearman, 1, 0).unwrap();
        let before = s.clone();
        assert!(matches!(
            start_training(&mut s, UnitType::Archer, 1, 0),
            Err(CommandRejection::NoFreeSlot { capacity: 1, .. })
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn test_slots_reused_after_completion() {
        let mut s = garrison().with_building_level(BuildingType::Barracks, 5);
        let a = start_training(&mut s, UnitType::Spearman, 1, 0).unwrap();
        let b = start_training(&mut s, UnitType::Archer, 1, 0).unwrap();
        assert_eq!((a.slot, b.slot), (0, 1));

        let done = resolve_completed(&mut s, a.completes_at);
        assert_eq!(done.len(), 1);
        let c = start_training(&mut s, UnitType::Scout, 1, a.completes_at).unwrap();
        assert_eq!(c.slot, 0);
    }

    #[test]
    fn test_resolve_adds_to_army_once() {
        let mut s = garrison();
        let order = start_training(&mut s, UnitType::Spearman, 4, 0).unwrap();

        assert!(resolve_completed(&mut s, order.completes_at - 1).is_empty());
        assert_eq!(resolve_completed(&mut s, order.completes_at).len(), 1);
        assert!(resolve_completed(&mut s, order.completes_at).is_empty());
        assert_eq!(s.units(UnitType::Spearman), 4);
        assert_eq!(s.population_used(), 4);
    }
}
