/// Simulation tick frequency (Hz).
pub const TICK_HZ: u32 = 60;

/// Fixed timestep for one simulation tick (seconds).
pub const FIXED_DT_S: f32 = 1.0 / TICK_HZ as f32;

/// Max dt (seconds) accepted by `RaceWorld::tick`.
///
/// Larger steps are clamped to avoid tunnelling through walls after a stall.
pub const MAX_DT_S: f32 = 0.1;

/// Squared length below which a direction is treated as degenerate.
pub const DIR_EPS_SQ: f32 = 1.0e-10;

/// Speeds below this magnitude are treated as stationary (m/s).
pub const SPEED_EPS: f32 = 1.0e-3;

/// Turn input magnitude below which the stick is considered centered.
pub const TURN_DEADZONE: f32 = 0.1;
