use super::config::KartTuning;

/// The four integer build stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KartStats {
    pub top_speed: i32,
    pub acceleration: i32,
    pub handling: i32,
    pub durability: i32,
}

impl KartStats {
    pub const fn new(top_speed: i32, acceleration: i32, handling: i32, durability: i32) -> Self {
        Self {
            top_speed,
            acceleration,
            handling,
            durability,
        }
    }

    fn zip_with(self, other: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        Self {
            top_speed: f(self.top_speed, other.top_speed),
            acceleration: f(self.acceleration, other.acceleration),
            handling: f(self.handling, other.handling),
            durability: f(self.durability, other.durability),
        }
    }

    fn clamped(self, min: i32, max: i32) -> Self {
        self.zip_with(self, |v, _| v.clamp(min, max))
    }
}

/// Where a kart's effective stats come from.
///
/// Effective = base kart + driver modifier + armor plate adjustment, clamped
/// to the tuning's stat range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatSources {
    pub kart: KartStats,
    pub driver: KartStats,
    /// Armor plates currently stacked on the kart.
    pub armor_plates: u8,
}

impl StatSources {
    pub fn new(kart: KartStats, driver: KartStats) -> Self {
        Self {
            kart,
            driver,
            armor_plates: 0,
        }
    }

    /// Each plate trades one point of acceleration for one point of durability.
    pub fn armor_adjustment(&self) -> KartStats {
        let plates = self.armor_plates as i32;
        KartStats::new(0, -plates, 0, plates)
    }

    pub fn effective(&self, tuning: &KartTuning) -> KartStats {
        self.kart
            .zip_with(self.driver, |a, b| a + b)
            .zip_with(self.armor_adjustment(), |a, b| a + b)
            .clamped(tuning.min_stat, tuning.max_stat)
    }
}

/// Float parameters derived from the build stats. Pure function of
/// `(KartStats, KartTuning)`; recomputed whenever a source stat changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedStats {
    pub top_speed: f32,
    pub reverse_top_speed: f32,
    pub acceleration: f32,
    pub reverse_acceleration: f32,
    pub braking_rate: f32,
    pub friction: f32,
    /// Max turn rate at full authority (rad/s).
    pub max_turn_rate: f32,
    /// Cap on turn-rate change (rad/s²).
    pub turn_acceleration: f32,
    /// Turn factor when steering into a slide.
    pub slide_inward: f32,
    /// Turn factor when counter-steering a slide.
    pub slide_outward: f32,
    /// Speed multiplier while sliding.
    pub slide_speed_modifier: f32,
    /// Speed multiplier at full non-slide turn rate.
    pub turning_speed_modifier: f32,
    /// Slide charge gained per radian turned while sliding.
    pub slide_charge_rate: f32,
    /// Multiplier (≤ 1) applied to incoming debuff durations.
    pub durability_factor: f32,
    /// Multiplier (≤ 1) applied to collision impulses.
    pub outside_force_resistance: f32,
    pub wheelie_speed_multiplier: f32,
}

impl DerivedStats {
    pub fn derive(stats: KartStats, tuning: &KartTuning) -> Self {
        let t = tuning;
        let speed = stats.top_speed as f32;
        let accel = stats.acceleration as f32;
        let handling = stats.handling as f32;
        let durability = stats.durability as f32;
        let durability_over_min = (stats.durability - t.min_stat).max(0) as f32;

        let top_speed = t.top_speed_base + t.top_speed_per_point * speed;
        let acceleration = t.acceleration_base + t.acceleration_per_point * accel;
        let max_turn_rate = t.turn_rate_base + t.turn_rate_per_point * handling;

        Self {
            top_speed,
            reverse_top_speed: top_speed * t.reverse_speed_ratio,
            acceleration,
            reverse_acceleration: acceleration * t.reverse_acceleration_ratio,
            braking_rate: t.braking_rate,
            friction: t.friction_base + t.friction_per_handling * handling,
            max_turn_rate,
            turn_acceleration: max_turn_rate * t.turn_acceleration_ratio,
            slide_inward: t.slide_inward_base + t.slide_factor_per_handling * handling,
            slide_outward: t.slide_outward_base + t.slide_factor_per_handling * handling,
            slide_speed_modifier: (t.slide_speed_modifier_base
                + t.speed_modifier_per_handling * handling)
                .min(1.0),
            turning_speed_modifier: (t.turning_speed_modifier_base
                + t.speed_modifier_per_handling * handling)
                .min(1.0),
            slide_charge_rate: t.slide_charge_rate_base
                + t.slide_charge_rate_per_handling * handling,
            durability_factor: (1.0 - t.durability_reduction_per_point * durability_over_min)
                .clamp(t.min_durability_factor, 1.0),
            outside_force_resistance: 1.0
                / (1.0 + t.outside_force_resistance_per_point * durability),
            wheelie_speed_multiplier: t.wheelie_speed_base
                + t.wheelie_speed_per_acceleration * accel,
        }
    }
}
