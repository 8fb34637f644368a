//! Construction queue - slot-limited building upgrades
//!
//! Each building is `idle -> upgrading -> idle(level + 1)`. Starting an
//! upgrade pays the full cost up front; there is no cancel or refund.

use crate::city::building::{BuildingType, UpgradeOrder};
use crate::city::settlement::Settlement;
use crate::core::error::{CommandRejection, QueueKind};
use crate::core::types::{Timestamp, MILLIS_PER_SECOND};
use crate::city::resource::Amounts;

/// Hard ceiling on concurrent work in any queue
pub const MAX_SLOTS: usize = 3;

/// Concurrent orders allowed at a given building level: `min(level/5 + 1, 3)`
pub fn slot_capacity(level: u32) -> usize {
    ((level / 5) as usize + 1).min(MAX_SLOTS)
}

/// A validated upgrade, not yet applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradePlan {
    pub building: BuildingType,
    pub target_level: u32,
    pub cost: Amounts,
    pub duration_secs: u64,
}

/// Upgrades paid for and not yet applied
pub fn pending(settlement: &Settlement) -> Vec<(BuildingType, UpgradeOrder)> {
    let mut orders: Vec<_> = settlement
        .buildings
        .iter()
        .filter_map(|(b, state)| state.upgrade.map(|u| (*b, u)))
        .collect();
    orders.sort_by_key(|(b, u)| (u.completes_at, *b));
    orders
}

/// Check every precondition for upgrading `building`
pub fn check_upgrade(
    settlement: &Settlement,
    building: BuildingType,
) -> Result<UpgradePlan, CommandRejection> {
    let state = settlement.building(building);
    if state.level >= building.max_level() {
        return Err(CommandRejection::MaxLevelReached {
            building,
            max_level: building.max_level(),
        });
    }
    if state.is_upgrading() {
        return Err(CommandRejection::UpgradeInProgress(building));
    }

    let hq_level = settlement.level(BuildingType::Headquarters);
    let capacity = slot_capacity(hq_level);
    if pending(settlement).len() >= capacity {
        return Err(CommandRejection::NoFreeSlot {
            queue: QueueKind::Construction,
            capacity,
        });
    }

    let target_level = state.level + 1;
    let cost = building.upgrade_cost(target_level);
    settlement.ledger.check_affordable(&cost)?;

    Ok(UpgradePlan {
        building,
        target_level,
        cost,
        duration_secs: building.upgrade_duration_secs(target_level, hq_level),
    })
}

pub fn can_start(settlement: &Settlement, building: BuildingType) -> bool {
    check_upgrade(settlement, building).is_ok()
}

/// Pay for and schedule the next level of `building`
pub fn start_upgrade(
    settlement: &mut Settlement,
    building: BuildingType,
    now: Timestamp,
) -> Result<UpgradeOrder, CommandRejection> {
    let plan = check_upgrade(settlement, building)?;
    settlement.ledger.spend(&plan.cost)?;

    let order = UpgradeOrder {
        target_level: plan.target_level,
        started_at: now,
        completes_at: now.saturating_add(plan.duration_secs.saturating_mul(MILLIS_PER_SECOND)),
    };
    settlement.buildings.entry(building).or_default().upgrade = Some(order);
    Ok(order)
}

/// Apply every upgrade whose completion time has passed
///
/// Applied orders are removed, so calling this again for the same `now`
/// changes nothing.
pub fn resolve_completed(settlement: &mut Settlement, now: Timestamp) -> Vec<(BuildingType, u32)> {
    let mut completed = Vec::new();
    for (building, state) in settlement.buildings.iter_mut() {
        let Some(order) = state.upgrade else {
            continue;
        };
        if order.completes_at <= now {
            state.level = order.target_level.min(building.max_level());
            state.upgrade = None;
            completed.push((*building, state.level));
        }
    }
    if !completed.is_empty() {
        settlement.refresh_capacities();
    }
    completed
}
