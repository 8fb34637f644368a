pub mod training;
pub mod unit;

pub use training::TrainingOrder;
pub use unit::{Army, UnitType};
