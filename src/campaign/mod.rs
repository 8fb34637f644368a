//! Campaign layer - the generated world and expeditions across it

pub mod battle;
pub mod expedition;
pub mod travel;
pub mod worldgen;

pub use battle::{BattleOutcome, BattleResolver, ScriptedResolver};
pub use expedition::{
    Expedition, ExpeditionKind, ExpeditionRequest, ExpeditionStatus, ExpeditionTarget,
};
pub use worldgen::{generate_chunk, ChunkCoord, GeneratedSettlement, WorldMap};
