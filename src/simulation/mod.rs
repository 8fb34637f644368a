//! Simulation layer - game state, the clock that advances it and the session that owns it

pub mod clock;
pub mod session;
pub mod state;

pub use clock::{tick, GameClock, GameEvent, TickReport};
pub use session::{Session, HOME_SETTLEMENT};
pub use state::GameState;
