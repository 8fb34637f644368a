//! Travel math for marches between tiles
//!
//! An army moves at the pace of its slowest member. Speeds come from
//! `UnitType::minutes_per_tile`; nothing here keeps its own table.

use crate::city::resource::Amounts;
use crate::core::types::{TileCoord, Timestamp, MILLIS_PER_MINUTE};
use crate::military::unit::Army;

/// Euclidean tile distance
pub fn distance(origin: TileCoord, target: TileCoord) -> f64 {
    origin.distance(&target)
}

/// Minutes per tile of the slowest unit with a non-zero count, `None` for an empty army
pub fn travel_speed(army: &Army) -> Option<f64> {
    army.iter()
        .filter(|(_, count)| **count > 0)
        .map(|(unit, _)| unit.minutes_per_tile())
        .reduce(f64::max)
}

/// `ceil(distance * minutes_per_tile)`
pub fn travel_minutes(distance: f64, minutes_per_tile: f64) -> u64 {
    (distance * minutes_per_tile).ceil().max(0.0) as u64
}

/// One-way leg length in milliseconds
pub fn leg_millis(travel_minutes: u64) -> Timestamp {
    travel_minutes * MILLIS_PER_MINUTE
}

/// Total loot the army can carry home
pub fn carry_capacity(army: &Army) -> u32 {
    army.iter()
        .map(|(unit, count)| unit.carry_capacity() * count)
        .sum()
}

/// Scale loot down so its total fits `capacity`, keeping the mix
pub fn cap_loot(loot: &Amounts, capacity: u32) -> Amounts {
    let goods_total: f64 = loot
        .iter()
        .filter(|(r, _)| r.is_collectable())
        .map(|(_, v)| v.max(0.0))
        .sum();
    let over = goods_total > capacity as f64;
    let mut capped = Amounts::zero();
    for (resource, value) in loot.iter() {
        if !resource.is_collectable() || value <= 0.0 {
            continue;
        }
        capped[resource] = if over {
            (value * capacity as f64 / goods_total).floor()
        } else {
            value
        };
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::resource::ResourceType;
    use crate::military::unit::UnitType;

    fn army(units: &[(UnitType, u32)]) -> Army {
        units.iter().copied().collect()
    }

    #[test]
    fn test_slowest_unit_sets_pace() {
        let mixed = army(&[(UnitType::Ram, 1), (UnitType::LightCavalry, 20)]);
        assert_eq!(travel_speed(&mixed), Some(30.0));
        assert_eq!(travel_minutes(40.0, 30.0), 1200);
    }

    #[test]
    fn test_zero_counts_ignored_for_pace() {
        let scouts = army(&[(UnitType::Ram, 0), (UnitType::Scout, 5)]);
        assert_eq!(travel_speed(&scouts), Some(9.0));
        assert_eq!(travel_speed(&Army::new()), None);
    }

    #[test]
    fn test_travel_minutes_rounds_up() {
        let d = distance(TileCoord::new(0, 0), TileCoord::new(1, 1));
        // sqrt(2) * 10 = 14.14
        assert_eq!(travel_minutes(d, 10.0), 15);
        assert_eq!(leg_millis(15), 900_000);
    }

    #[test]
    fn test_carry_capacity_sums_units() {
        let raiders = army(&[(UnitType::LightCavalry, 10), (UnitType::Spearman, 4)]);
        assert_eq!(carry_capacity(&raiders), 900);
        assert_eq!(carry_capacity(&army(&[(UnitType::Ram, 3)])), 0);
    }

    #[test]
    fn test_cap_loot_scales_to_capacity() {
        let loot = Amounts::from_pairs(&[(ResourceType::Wood, 300.0), (ResourceType::Iron, 100.0)]);
        let capped = cap_loot(&loot, 200);
        assert_eq!(capped[ResourceType::Wood], 150.0);
        assert_eq!(capped[ResourceType::Iron], 50.0);

        let small = cap_loot(&loot, 1000);
        assert_eq!(small, loot);
    }

    #[test]
    fn test_cap_loot_drops_population() {
        let loot = Amounts::from_pairs(&[(ResourceType::Population, 50.0), (ResourceType::Gold, 5.0)]);
        let capped = cap_loot(&loot, 100);
        assert_eq!(capped[ResourceType::Population], 0.0);
        assert_eq!(capped[ResourceType::Gold], 5.0);
    }
}
