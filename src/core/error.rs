use thiserror::Error;

use crate::campaign::expedition::ExpeditionStatus;
use crate::city::building::BuildingType;
use crate::city::resource::ResourceType;
use crate::core::types::{ExpeditionId, SettlementId, TileCoord};
use crate::military::unit::UnitType;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CommandRejection),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFound),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Which slot-limited queue a rejection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Construction,
    Training,
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Construction => write!(f, "construction"),
            QueueKind::Training => write!(f, "training"),
        }
    }
}

/// Reasons a command is refused. A refused command never changes state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandRejection {
    #[error("{building} is already at max level {max_level}")]
    MaxLevelReached {
        building: BuildingType,
        max_level: u32,
    },

    #[error("{0} already has an upgrade in progress")]
    UpgradeInProgress(BuildingType),

    #[error("insufficient {resource}: need {required}, have {available:.0}")]
    InsufficientResources {
        resource: ResourceType,
        required: f64,
        available: f64,
    },

    #[error("no free {queue} slot (capacity {capacity})")]
    NoFreeSlot { queue: QueueKind, capacity: usize },

    #[error("population cap exceeded: need {required}, only {available} free")]
    PopulationCapExceeded { required: u32, available: u32 },

    #[error("training requires a barracks")]
    BarracksRequired,

    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("expedition army is empty")]
    EmptyArmy,

    #[error("requested {requested} {unit} but only {available} available")]
    ArmyExceedsAvailable {
        unit: UnitType,
        requested: u32,
        available: u32,
    },

    #[error("departure offset {0} ms puts the march beyond the end of time")]
    DepartureOutOfRange(u64),

    #[error("target {0} is the origin settlement")]
    TargetIsOrigin(TileCoord),

    #[error("{0} cannot be collected")]
    NotCollectable(ResourceType),

    #[error("{id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ExpeditionId,
        from: ExpeditionStatus,
        to: ExpeditionStatus,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotFound {
    #[error("{0}")]
    Settlement(SettlementId),

    #[error("building '{0}'")]
    Building(String),

    #[error("unit type '{0}'")]
    Unit(String),

    #[error("resource '{0}'")]
    Resource(String),

    #[error("{0}")]
    Expedition(ExpeditionId),

    #[error("no settlement at {0}")]
    Target(TileCoord),
}

pub type Result<T> = std::result::Result<T, GameError>;
