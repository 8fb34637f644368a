//! Production - hourly yields, time-based accrual and capacity curves
//!
//! Accrual is a single linear formula. A one-second tick and a three-day
//! offline gap go through the same `accrue` call, so splitting elapsed time
//! into many ticks gives the same total as one large tick.

use crate::city::building::BuildingType;
use crate::city::resource::Amounts;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Storage holds `floor(STORAGE_BASE * STORAGE_GROWTH^level)` of each good
const STORAGE_BASE: f64 = 1000.0;
const STORAGE_GROWTH: f64 = 1.25;

/// Housing room: `floor(HOUSING_BASE * HOUSING_GROWTH^level)`
const HOUSING_BASE: f64 = 40.0;
const HOUSING_GROWTH: f64 = 1.3;

/// Mouths the farms can feed: `floor(FOOD_BASE * FOOD_GROWTH^level)`
const FOOD_BASE: f64 = 60.0;
const FOOD_GROWTH: f64 = 1.25;

/// Sum hourly output over all producing buildings
///
/// Buildings without a production formula contribute nothing.
pub fn hourly_yield<I>(levels: I) -> Amounts
where
    I: IntoIterator<Item = (BuildingType, u32)>,
{
    let mut total = Amounts::zero();
    for (building, level) in levels {
        if let Some(curve) = building.production() {
            total[curve.resource] += curve.hourly_output(level);
        }
    }
    total
}

/// Resources produced over `elapsed_seconds` at the given hourly yield
///
/// `delta[r] = yield[r] / 3600 * elapsed`. Fractions are kept.
pub fn accrue(hourly: &Amounts, elapsed_seconds: f64) -> Amounts {
    let elapsed = elapsed_seconds.max(0.0);
    let mut delta = Amounts::zero();
    for (resource, per_hour) in hourly.iter() {
        delta[resource] = per_hour / SECONDS_PER_HOUR * elapsed;
    }
    delta
}

pub fn storage_capacity(storage_level: u32) -> f64 {
    (STORAGE_BASE * STORAGE_GROWTH.powi(storage_level as i32)).floor()
}

pub fn housing_capacity(housing_level: u32) -> u32 {
    (HOUSING_BASE * HOUSING_GROWTH.powi(housing_level as i32)).floor() as u32
}

pub fn food_capacity(farm_level: u32) -> u32 {
    (FOOD_BASE * FOOD_GROWTH.powi(farm_level as i32)).floor() as u32
}

/// Population cap is limited by both housing and food supply
pub fn population_capacity(housing_level: u32, farm_level: u32) -> u32 {
    housing_capacity(housing_level).min(food_capacity(farm_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::resource::ResourceType;

    #[test]
    fn test_hourly_yield_sums_producers() {
        let levels = [
            (BuildingType::Woodcutter, 3),
            (BuildingType::ClayPit, 1),
            (BuildingType::Headquarters, 10),
            (BuildingType::Storage, 4),
        ];
        let y = hourly_yield(levels);
        assert_eq!(y[ResourceType::Wood], 121.0);
        assert_eq!(y[ResourceType::Clay], 30.0);
        assert_eq!(y[ResourceType::Iron], 0.0);
    }

    #[test]
    fn test_level_zero_produces_nothing() {
        let y = hourly_yield([(BuildingType::Farm, 0), (BuildingType::Bakery, 0)]);
        assert!(y.is_zero());
    }

    #[test]
    fn test_accrue_one_hour() {
        let hourly = Amounts::from_pairs(&[(ResourceType::Wood, 121.0)]);
        let delta = accrue(&hourly, 3600.0);
        assert!((delta[ResourceType::Wood] - 121.0).abs() < 1e-9);
    }

    #[test]
    fn test_accrue_keeps_fractions() {
        // 30/h over one second is far below one unit
        let hourly = Amounts::from_pairs(&[(ResourceType::Clay, 30.0)]);
        let mut total = Amounts::zero();
        for _ in 0..3600 {
            total += accrue(&hourly, 1.0);
        }
        assert!((total[ResourceType::Clay] - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_accrue_negative_elapsed_is_zero() {
        let hourly = Amounts::from_pairs(&[(ResourceType::Clay, 30.0)]);
        assert!(accrue(&hourly, -50.0).is_zero());
    }

    #[test]
    fn test_capacity_curves() {
        assert_eq!(storage_capacity(0), 1000.0);
        assert_eq!(storage_capacity(1), 1250.0);
        assert_eq!(storage_capacity(2), 1562.0);

        assert_eq!(housing_capacity(0), 40);
        assert_eq!(food_capacity(0), 60);
        // Housing is the bottleneck early, food later
        assert_eq!(population_capacity(0, 0), 40);
        assert_eq!(population_capacity(5, 0), 60);
    }
}
