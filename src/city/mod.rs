//! City layer - buildings, construction, production and storage

pub mod building;
pub mod construction;
pub mod ledger;
pub mod production;
pub mod resource;
pub mod settlement;

pub use building::{BuildingState, BuildingType, UpgradeOrder};
pub use ledger::Ledger;
pub use resource::{Amounts, ResourceType};
pub use settlement::Settlement;
