//! Ledger - settlement-level resource storage and the uncollected buffer

use serde::{Deserialize, Serialize};

use crate::city::resource::{Amounts, ResourceType};
use crate::core::error::CommandRejection;

/// Result of moving the uncollected buffer into storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collection {
    pub stored: Amounts,
    pub uncollected: Amounts,
    pub collected: Amounts,
}

/// Move as much of `uncollected` into `stored` as capacity allows
///
/// For each targeted good: `collectable = min(uncollected, capacity - stored)`.
/// Whatever does not fit stays in the buffer for a later collection.
pub fn collect(
    uncollected: &Amounts,
    stored: &Amounts,
    capacity: f64,
    target: Option<ResourceType>,
) -> Collection {
    let mut out = Collection {
        stored: *stored,
        uncollected: *uncollected,
        collected: Amounts::zero(),
    };
    let targets = ResourceType::goods().filter(|r| target.map_or(true, |t| t == *r));
    for resource in targets {
        let room = (capacity - stored[resource]).max(0.0);
        let amount = uncollected[resource].min(room).max(0.0);
        out.stored[resource] += amount;
        out.uncollected[resource] -= amount;
        out.collected[resource] = amount;
    }
    out
}

/// Stored resources, the uncollected buffer and the caps that bound them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub stored: Amounts,
    pub uncollected: Amounts,
    /// Per-good storage limit
    pub storage_capacity: f64,
    pub population_cap: u32,
}

impl Ledger {
    pub fn new(storage_capacity: f64, population_cap: u32) -> Self {
        Self {
            stored: Amounts::zero(),
            uncollected: Amounts::zero(),
            storage_capacity,
            population_cap,
        }
    }

    pub fn with_stored(mut self, stored: Amounts) -> Self {
        self.stored = stored;
        self
    }

    pub fn population_used(&self) -> u32 {
        self.stored[ResourceType::Population] as u32
    }

    pub fn population_free(&self) -> u32 {
        self.population_cap.saturating_sub(self.population_used())
    }

    pub fn set_population_used(&mut self, used: u32) {
        self.stored[ResourceType::Population] = used as f64;
    }

    /// Check that stored goods cover `cost`
    pub fn check_affordable(&self, cost: &Amounts) -> Result<(), CommandRejection> {
        match self.stored.shortfall(cost) {
            Some((resource, required, available)) => {
                Err(CommandRejection::InsufficientResources {
                    resource,
                    required,
                    available,
                })
            }
            None => Ok(()),
        }
    }

    /// Deduct `cost` from storage, all or nothing
    pub fn spend(&mut self, cost: &Amounts) -> Result<(), CommandRejection> {
        self.check_affordable(cost)?;
        self.stored = self.stored.saturating_sub(cost);
        Ok(())
    }

    /// Add produced or looted goods to the uncollected buffer
    pub fn credit_uncollected(&mut self, delta: &Amounts) {
        for resource in ResourceType::goods() {
            self.uncollected[resource] += delta[resource].max(0.0);
        }
    }

    /// Collect one good, or every good when `target` is `None`
    pub fn collect(&mut self, target: Option<ResourceType>) -> Result<Amounts, CommandRejection> {
        if let Some(resource) = target {
            if !resource.is_collectable() {
                return Err(CommandRejection::NotCollectable(resource));
            }
        }
        let result = collect(
            &self.uncollected,
            &self.stored,
            self.storage_capacity,
            target,
        );
        self.stored = result.stored;
        self.uncollected = result.uncollected;
        Ok(result.collected)
    }
}
