//! Resource types and enum-indexed resource amounts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul};
use std::str::FromStr;

use crate::core::error::NotFound;

/// Closed set of resources a settlement deals in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Wood,
    Clay,
    Iron,
    Coal,
    Wheat,
    Bread,
    Meat,
    Gold,
    /// Occupied housing. Never produced or collected.
    Population,
}

impl ResourceType {
    pub const COUNT: usize = 9;

    pub const ALL: [ResourceType; Self::COUNT] = [
        ResourceType::Wood,
        ResourceType::Clay,
        ResourceType::Iron,
        ResourceType::Coal,
        ResourceType::Wheat,
        ResourceType::Bread,
        ResourceType::Meat,
        ResourceType::Gold,
        ResourceType::Population,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Wood => "wood",
            ResourceType::Clay => "clay",
            ResourceType::Iron => "iron",
            ResourceType::Coal => "coal",
            ResourceType::Wheat => "wheat",
            ResourceType::Bread => "bread",
            ResourceType::Meat => "meat",
            ResourceType::Gold => "gold",
            ResourceType::Population => "population",
        }
    }

    /// Whether this resource moves through the uncollected buffer into storage
    pub fn is_collectable(self) -> bool {
        self != ResourceType::Population
    }

    /// Every resource that is stored and bounded by storage capacity
    pub fn goods() -> impl Iterator<Item = ResourceType> {
        Self::ALL.into_iter().filter(|r| r.is_collectable())
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = NotFound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| NotFound::Resource(s.to_string()))
    }
}

/// One non-negative quantity per resource type
///
/// Fractional values are kept so that short ticks accumulate without loss.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Amounts([f64; ResourceType::COUNT]);

impl Amounts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(ResourceType, f64)]) -> Self {
        let mut amounts = Self::zero();
        for (resource, value) in pairs {
            amounts[*resource] += *value;
        }
        amounts
    }

    pub fn get(&self, resource: ResourceType) -> f64 {
        self.0[resource.index()]
    }

    pub fn set(&mut self, resource: ResourceType, value: f64) {
        self.0[resource.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, f64)> + '_ {
        ResourceType::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    /// Entries with a value above zero
    pub fn non_zero(&self) -> impl Iterator<Item = (ResourceType, f64)> + '_ {
        self.iter().filter(|(_, v)| *v > 0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// First resource where `self` cannot pay for `cost`, as (resource, required, available)
    pub fn shortfall(&self, cost: &Amounts) -> Option<(ResourceType, f64, f64)> {
        cost.non_zero()
            .find(|(r, required)| self.get(*r) < *required)
            .map(|(r, required)| (r, required, self.get(r)))
    }

    pub fn covers(&self, cost: &Amounts) -> bool {
        self.shortfall(cost).is_none()
    }

    /// Subtract `other`, clamping each entry at zero
    pub fn saturating_sub(&self, other: &Amounts) -> Amounts {
        let mut out = *self;
        for r in ResourceType::ALL {
            out[r] = (out[r] - other[r]).max(0.0);
        }
        out
    }
}

impl Index<ResourceType> for Amounts {
    type Output = f64;
    fn index(&self, resource: ResourceType) -> &f64 {
        &self.0[resource.index()]
    }
}

impl IndexMut<ResourceType> for Amounts {
    fn index_mut(&mut self, resource: ResourceType) -> &mut f64 {
        &mut self.0[resource.index()]
    }
}

impl Add for Amounts {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs += rhs;
        }
    }
}

impl Mul<f64> for Amounts {
    type Output = Self;
    fn mul(mut self, rhs: f64) -> Self {
        for value in self.0.iter_mut() {
            *value *= rhs;
        }
        self
    }
}

impl fmt::Display for Amounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (resource, value) in self.non_zero() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", value.floor(), resource)?;
            first = false;
        }
        if first {
            write!(f, "nothing")?;
        }
        Ok(())
    }
}
