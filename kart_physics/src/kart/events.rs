use crate::{collision::ContactReport, entity::EntityId};

/// Something that happened to a kart, queued in its inbox and applied at the
/// start of its next tick in FIFO order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KartEvent {
    /// Raise speed toward `top_speed * power`.
    Boost { power: f32 },
    SpinOut { duration: f32 },
    Slow { power: f32, duration: f32 },
    TurnLock { duration: f32 },
    /// Set the number of stacked armor plates.
    ArmorPlate { stacks: u8 },
    WheelieToggle,
    Contact(ContactReport),
}

/// Something a kart controller reports outward (HUD, audio, ability scripts).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KartSignal {
    BoostStarted { power: f32 },
    /// Slide released with enough charge; a boost follows.
    SlideBoost { charge: f32 },
    SlideStarted { direction: i8 },
    SlideEnded,
    SpinOutStarted { duration: f32 },
    SlowStarted { power: f32, duration: f32 },
    /// The slow debuff expired; the HUD removes its indicator.
    SlowEnded,
    TurnLockStarted { duration: f32 },
    ArmorChanged { stacks: u8 },
    WheelieChanged { active: bool },
    TookOff,
    Landed,
    HitWall { other: EntityId },
    HitKart { other: EntityId },
    /// Detect-only contact (projectiles, item boxes); abilities decide the effect.
    Touched { other: EntityId },
}
