//! Settlement Sim - production, queues and expeditions for a single-player settlement game

pub mod campaign;
pub mod city;
pub mod core;
pub mod military;
pub mod simulation;
