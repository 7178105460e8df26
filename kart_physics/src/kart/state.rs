use crate::{bitmask_flags::BitmaskFlags, define_bitmask_flags, types::Vec3};

define_bitmask_flags!(
    /// Boolean movement states of a kart.
    KartStatus, u8, {
        Airborne,
        Sliding,
        Wheelie,
        Offroad,
        /// Pre-race countdown: all input ignored.
        Disabled,
    }
);

/// A countdown that new applications may extend but never shorten.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DebuffTimer {
    remaining: f32,
}

impl DebuffTimer {
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// `remaining = max(remaining, duration)`. Returns true if it grew.
    pub fn extend(&mut self, duration: f32) -> bool {
        if duration > self.remaining {
            self.remaining = duration;
            return true;
        }
        false
    }

    /// Count down by `dt`. Returns true on the tick the timer expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining == 0.0
    }
}

/// Full movement state of one kart.
#[derive(Clone, Debug, PartialEq)]
pub struct KartMovementState {
    /// Signed forward speed (m/s); negative while reversing.
    pub speed: f32,
    /// Radians in [0, 2π).
    pub heading: f32,
    /// Current angular speed (rad/s).
    pub turn_speed: f32,
    pub vertical_speed: f32,
    pub status: BitmaskFlags<u8>,
    /// -1, 0 or 1.
    pub slide_direction: i8,
    /// In [0, max_slide_charge]; zero whenever not sliding.
    pub slide_charge: f32,
    /// Cosmetic lean (radians) added to the heading when rendering.
    pub swerve: f32,
    /// Decaying impulse velocity from collisions (m/s).
    pub outside_force: Vec3,
    /// Offroad speed jitter applied this tick.
    pub rumble: f32,
    /// Expected ground height (track + ride height) at the last tick.
    pub last_ground_height: Option<f32>,
    /// Rate of change of the ground height while grounded (m/s).
    pub ground_climb_rate: f32,

    pub spin_out: DebuffTimer,
    pub turn_lock: DebuffTimer,
    pub slow: DebuffTimer,
    /// Speed multiplier while slowed; 1.0 when not slowed.
    pub slow_power: f32,

    /// Slide input as seen (after gating) last tick, for edge detection.
    pub previous_slide_input: bool,
}

impl Default for KartMovementState {
    fn default() -> Self {
        Self {
            speed: 0.0,
            heading: 0.0,
            turn_speed: 0.0,
            vertical_speed: 0.0,
            status: BitmaskFlags::default(),
            slide_direction: 0,
            slide_charge: 0.0,
            swerve: 0.0,
            outside_force: Vec3::zeros(),
            rumble: 0.0,
            last_ground_height: None,
            ground_climb_rate: 0.0,
            spin_out: DebuffTimer::default(),
            turn_lock: DebuffTimer::default(),
            slow: DebuffTimer::default(),
            slow_power: 1.0,
            previous_slide_input: false,
        }
    }
}

impl KartMovementState {
    pub fn with_heading(heading: f32) -> Self {
        Self {
            heading: wrap_angle(heading),
            ..Self::default()
        }
    }

    pub fn is_airborne(&self) -> bool {
        self.status.has(KartStatus::Airborne)
    }

    pub fn is_sliding(&self) -> bool {
        self.status.has(KartStatus::Sliding)
    }

    pub fn is_wheelie(&self) -> bool {
        self.status.has(KartStatus::Wheelie)
    }

    pub fn is_offroad(&self) -> bool {
        self.status.has(KartStatus::Offroad)
    }

    pub fn is_disabled(&self) -> bool {
        self.status.has(KartStatus::Disabled)
    }
}

/// Wrap radians into [0, 2π).
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Move `current` toward `target` by at most `max_step`.
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    current + (target - current).clamp(-max_step, max_step)
}
