/*!
Kart tuning coefficients.

Every number the movement model uses lives in [`KartTuning`] so designers can
override it from TOML without touching code. Missing keys fall back to the
compiled-in defaults.

Notes
- Speeds are m/s, rates are m/s², angles are radians, times are seconds.
- Stat coefficients are "per build-stat point" (stats range 1..=10).
*/

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KartTuning {
    // ========================================================================
    // Build stats
    // ========================================================================
    pub min_stat: i32,
    pub max_stat: i32,

    // ========================================================================
    // Stat derivation
    // ========================================================================
    pub top_speed_base: f32,
    pub top_speed_per_point: f32,
    /// Reverse top speed as a fraction of forward top speed.
    pub reverse_speed_ratio: f32,
    pub acceleration_base: f32,
    pub acceleration_per_point: f32,
    /// Reverse acceleration as a fraction of forward acceleration.
    pub reverse_acceleration_ratio: f32,
    pub braking_rate: f32,
    pub friction_base: f32,
    pub friction_per_handling: f32,
    pub turn_rate_base: f32,
    pub turn_rate_per_point: f32,
    /// Angular acceleration cap as a multiple of the max turn rate (1/s).
    pub turn_acceleration_ratio: f32,
    pub slide_inward_base: f32,
    pub slide_outward_base: f32,
    pub slide_factor_per_handling: f32,
    pub slide_speed_modifier_base: f32,
    pub turning_speed_modifier_base: f32,
    pub speed_modifier_per_handling: f32,
    pub slide_charge_rate_base: f32,
    pub slide_charge_rate_per_handling: f32,
    /// Debuff duration reduction per durability point above the minimum.
    pub durability_reduction_per_point: f32,
    pub min_durability_factor: f32,
    pub outside_force_resistance_per_point: f32,
    pub wheelie_speed_base: f32,
    pub wheelie_speed_per_acceleration: f32,

    // ========================================================================
    // Speed
    // ========================================================================
    /// Deceleration cap while above top speed with the throttle held (after a boost).
    pub overspeed_decay: f32,
    pub offroad_multiplier: f32,
    /// Max random deviation added to the offroad multiplier each tick.
    pub rumble_jitter: f32,
    /// Max AI speed bonus/penalty from rubber banding.
    pub rubber_band_strength: f32,
    /// Race-progress distance over which rubber banding ramps to full strength (meters).
    pub rubber_band_range: f32,
    /// How much of the remaining gap to boost target a boost keeps at top speed.
    pub boost_falloff: f32,

    // ========================================================================
    // Turning
    // ========================================================================
    /// Speed ratio (speed / top speed) at which turning authority peaks.
    pub turn_peak_speed_ratio: f32,
    /// Turning authority left at top speed.
    pub high_speed_turn_authority: f32,
    pub wheelie_turn_multiplier: f32,
    pub max_swerve: f32,
    pub swerve_rate: f32,

    // ========================================================================
    // Vertical
    // ========================================================================
    /// Height of the kart origin above the track surface (meters).
    pub ride_height: f32,
    /// Dead zone around the expected height inside which karts stay glued to the track.
    pub sticky_band: f32,
    pub gravity: f32,
    pub hop_speed: f32,
    /// Vertical speed added once on takeoff.
    pub takeoff_vertical_boost: f32,
    /// Forward speed multiplier applied once on takeoff.
    pub takeoff_speed_boost: f32,
    pub landing_speed_damping: f32,

    // ========================================================================
    // Sliding
    // ========================================================================
    pub min_slide_speed: f32,
    pub max_slide_charge: f32,
    pub slide_boost_threshold: f32,
    /// Boost power at full charge is `1 + slide_boost_scale`.
    pub slide_boost_scale: f32,

    // ========================================================================
    // Collision response and visuals
    // ========================================================================
    /// Per-second exponential decay rate of the outside force (negative).
    pub outside_force_decay_rate: f32,
    pub wall_bounce: f32,
    pub wall_speed_multiplier: f32,
    pub kart_bounce: f32,
    pub spin_out_spin_rate: f32,
    pub wheelie_pitch: f32,
}

impl Default for KartTuning {
    fn default() -> Self {
        Self {
            min_stat: 1,
            max_stat: 10,

            top_speed_base: 20.0,
            top_speed_per_point: 2.0,
            reverse_speed_ratio: 0.35,
            acceleration_base: 6.0,
            acceleration_per_point: 1.2,
            reverse_acceleration_ratio: 0.6,
            braking_rate: 35.0,
            friction_base: 8.0,
            friction_per_handling: 0.2,
            turn_rate_base: 1.6,
            turn_rate_per_point: 0.12,
            turn_acceleration_ratio: 6.0,
            slide_inward_base: 1.25,
            slide_outward_base: 0.45,
            slide_factor_per_handling: 0.02,
            slide_speed_modifier_base: 0.92,
            turning_speed_modifier_base: 0.96,
            speed_modifier_per_handling: 0.004,
            slide_charge_rate_base: 0.8,
            slide_charge_rate_per_handling: 0.05,
            durability_reduction_per_point: 0.06,
            min_durability_factor: 0.4,
            outside_force_resistance_per_point: 0.08,
            wheelie_speed_base: 1.12,
            wheelie_speed_per_acceleration: 0.01,

            overspeed_decay: 6.0,
            offroad_multiplier: 0.55,
            rumble_jitter: 0.05,
            rubber_band_strength: 0.12,
            rubber_band_range: 50.0,
            boost_falloff: 0.5,

            turn_peak_speed_ratio: 0.35,
            high_speed_turn_authority: 0.7,
            wheelie_turn_multiplier: 0.5,
            max_swerve: 0.15,
            swerve_rate: 1.5,

            ride_height: 0.5,
            sticky_band: 0.25,
            gravity: 30.0,
            hop_speed: 4.0,
            takeoff_vertical_boost: 2.0,
            takeoff_speed_boost: 1.05,
            landing_speed_damping: 0.98,

            min_slide_speed: 8.0,
            max_slide_charge: 1.0,
            slide_boost_threshold: 0.3,
            slide_boost_scale: 0.35,

            outside_force_decay_rate: -5.0,
            wall_bounce: 0.6,
            wall_speed_multiplier: 0.7,
            kart_bounce: 0.4,
            spin_out_spin_rate: 4.0 * std::f32::consts::PI,
            wheelie_pitch: 0.35,
        }
    }
}

/// Failure to load a [`KartTuning`].
#[derive(Debug)]
pub enum ConfigError {
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "failed to parse kart tuning: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid kart tuning: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl KartTuning {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let tuning: Self = toml::from_str(src)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break the model's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.to_string()))
        };

        if self.min_stat < 0 || self.min_stat > self.max_stat {
            return invalid("min_stat must be in 0..=max_stat");
        }
        if self.top_speed_base <= 0.0 || self.acceleration_base <= 0.0 {
            return invalid("top_speed_base and acceleration_base must be positive");
        }
        if self.braking_rate <= 0.0 || self.friction_base <= 0.0 {
            return invalid("braking_rate and friction_base must be positive");
        }
        if !(0.0..1.0).contains(&self.turn_peak_speed_ratio) || self.turn_peak_speed_ratio == 0.0 {
            return invalid("turn_peak_speed_ratio must be in (0, 1)");
        }
        if self.sticky_band < 0.0 || self.gravity <= 0.0 {
            return invalid("sticky_band must be >= 0 and gravity > 0");
        }
        if self.max_slide_charge <= 0.0 || self.slide_boost_threshold > self.max_slide_charge {
            return invalid("slide_boost_threshold must not exceed a positive max_slide_charge");
        }
        if self.outside_force_decay_rate >= 0.0 {
            return invalid("outside_force_decay_rate must be negative");
        }
        if !(0.0..=1.0).contains(&self.min_durability_factor) {
            return invalid("min_durability_factor must be in [0, 1]");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(KartTuning::default().validate().is_ok());
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let tuning = KartTuning::from_toml_str(
            r#"
            top_speed_base = 25.0
            gravity = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(tuning.top_speed_base, 25.0);
        assert_eq!(tuning.gravity, 20.0);
        assert_eq!(tuning.braking_rate, KartTuning::default().braking_rate);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = KartTuning::from_toml_str("outside_force_decay_rate = 2.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = KartTuning::from_toml_str("gravity = \"heavy\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse"));
    }
}
