//! Kart movement: build stats, tuning, per-tick controller and its
//! collision response.

pub mod config;
pub mod controller;
pub mod events;
pub mod input;
mod response;
pub mod state;
pub mod stats;

pub use config::{ConfigError, KartTuning};
pub use controller::{AiDriver, KartEnv, KartMovementController, RubberBand, turn_authority};
pub use events::{KartEvent, KartSignal};
pub use input::KartInput;
pub use state::{DebuffTimer, KartMovementState, KartStatus};
pub use stats::{DerivedStats, KartStats, StatSources};
