use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{
    config::KartTuning,
    events::{KartEvent, KartSignal},
    input::KartInput,
    state::{KartMovementState, KartStatus, approach, wrap_angle},
    stats::{DerivedStats, KartStats, StatSources},
};
use crate::{
    constants::{SPEED_EPS, TURN_DEADZONE},
    entity::EntityId,
    track::{Surface, TrackHeightProvider},
    transform::{TransformId, TransformTree},
    types::{Quat, Vec3, heading_forward},
};

/// Marks a kart as computer-driven.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiDriver {
    /// Scales the tuning's rubber-band strength for this driver (0 disables it).
    pub rubber_band_scale: f32,
}

impl Default for AiDriver {
    fn default() -> Self {
        Self {
            rubber_band_scale: 1.0,
        }
    }
}

/// Race progress used to rubber-band AI karts against the human field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RubberBand {
    pub own_progress: f32,
    pub lead_human_progress: f32,
    pub last_human_progress: f32,
}

impl RubberBand {
    /// Speed factor: below 1 when ahead of the lead human, above 1 when
    /// behind the trailing human, ramping to full `strength` over `range`.
    pub fn factor(&self, strength: f32, range: f32) -> f32 {
        if range <= 0.0 {
            return 1.0;
        }
        if self.own_progress > self.lead_human_progress {
            1.0 - strength * ((self.own_progress - self.lead_human_progress) / range).min(1.0)
        } else if self.own_progress < self.last_human_progress {
            1.0 + strength * ((self.last_human_progress - self.own_progress) / range).min(1.0)
        } else {
            1.0
        }
    }
}

/// Collaborators a controller reads during its tick.
pub struct KartEnv<'a> {
    pub tree: &'a mut TransformTree,
    pub track: &'a dyn TrackHeightProvider,
    /// Only consulted for AI karts.
    pub rubber_band: Option<RubberBand>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlideExit {
    LowSpeed,
    Offroad,
    Released,
}

/// Per-kart movement state machine.
///
/// Owns the kart's [`KartMovementState`] and writes the resulting pose into the
/// kart's transform node once per tick. Nothing else mutates the state; other
/// systems go through [`KartEvent`]s or the ability hooks.
pub struct KartMovementController {
    entity: EntityId,
    node: TransformId,
    tuning: KartTuning,
    sources: StatSources,
    stats: KartStats,
    derived: DerivedStats,
    state: KartMovementState,
    ai: Option<AiDriver>,
    rng: StdRng,
    signals: Vec<KartSignal>,
}

impl KartMovementController {
    pub fn new(
        entity: EntityId,
        node: TransformId,
        sources: StatSources,
        tuning: KartTuning,
    ) -> Self {
        let stats = sources.effective(&tuning);
        let derived = DerivedStats::derive(stats, &tuning);
        Self {
            entity,
            node,
            tuning,
            sources,
            stats,
            derived,
            state: KartMovementState::default(),
            ai: None,
            rng: StdRng::seed_from_u64(entity),
            signals: Vec::new(),
        }
    }

    pub fn with_ai(mut self, ai: AiDriver) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.state = KartMovementState::with_heading(heading);
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn node(&self) -> TransformId {
        self.node
    }

    pub fn state(&self) -> &KartMovementState {
        &self.state
    }

    pub fn stats(&self) -> KartStats {
        self.stats
    }

    pub fn derived(&self) -> &DerivedStats {
        &self.derived
    }

    pub fn tuning(&self) -> &KartTuning {
        &self.tuning
    }

    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Replace the stat sources (kart or driver swap) and re-derive.
    pub fn set_stat_sources(&mut self, sources: StatSources) {
        self.sources = sources;
        self.rederive();
    }

    /// Enable or disable input (pre-race countdown).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.status.set(KartStatus::Disabled, !enabled);
    }

    pub fn drain_signals(&mut self) -> Vec<KartSignal> {
        std::mem::take(&mut self.signals)
    }

    fn rederive(&mut self) {
        let stats = self.sources.effective(&self.tuning);
        if stats != self.stats {
            log::debug!("kart {:#x} stats {:?} -> {:?}", self.entity, self.stats, stats);
        }
        self.stats = stats;
        self.derived = DerivedStats::derive(stats, &self.tuning);
    }

    /// Apply one queued event.
    pub fn handle_event(&mut self, event: KartEvent, tree: &mut TransformTree) {
        match event {
            KartEvent::Boost { power } => self.boost(power),
            KartEvent::SpinOut { duration } => self.spin_out(duration),
            KartEvent::Slow { power, duration } => self.slow(power, duration),
            KartEvent::TurnLock { duration } => self.turn_lock(duration),
            KartEvent::ArmorPlate { stacks } => self.armor_plate(stacks),
            KartEvent::WheelieToggle => self.wheelie_toggle(),
            KartEvent::Contact(report) => self.on_contact(&report, tree),
        }
    }

    /// Advance one tick: input gating, debuffs, speed, turning, vertical
    /// motion, slide exit, then commit the pose to the transform node.
    pub fn tick(&mut self, dt: f32, input: KartInput, env: &mut KartEnv<'_>) {
        if dt <= 0.0 {
            return;
        }
        let Some(position) = env.tree.local_translation(self.node) else {
            log::warn!("kart {:#x} has no transform node, skipping tick", self.entity);
            return;
        };

        let (input, suppressed) = self.gate_input(input.sanitized(), dt);
        self.decay_debuffs(dt);
        self.sample_surface(env.track, &position);
        self.update_speed(dt, &input, env.rubber_band);
        self.update_turn(dt, &input);
        let vertical_delta = self.update_vertical(dt, &input, env.track, &position);
        self.update_slide_exit(&input, suppressed);
        self.state.previous_slide_input = input.slide;
        self.commit_transform(dt, vertical_delta, position, env.tree);
    }

    /// Returns the effective input and whether all input was suppressed.
    fn gate_input(&mut self, input: KartInput, dt: f32) -> (KartInput, bool) {
        if self.state.is_disabled() {
            (KartInput::NONE, true)
        } else if self.state.spin_out.is_active() {
            self.state.spin_out.tick(dt);
            (KartInput::NONE, true)
        } else if self.state.turn_lock.is_active() {
            self.state.turn_lock.tick(dt);
            (input.without_turn(), false)
        } else {
            (input, false)
        }
    }

    fn decay_debuffs(&mut self, dt: f32) {
        if self.state.slow.tick(dt) {
            self.state.slow_power = 1.0;
            log::debug!("kart {:#x} slow expired", self.entity);
            self.signals.push(KartSignal::SlowEnded);
        }
    }

    fn sample_surface(&mut self, track: &dyn TrackHeightProvider, position: &Vec3) {
        let offroad = !self.state.is_airborne() && track.surface_at(position) == Surface::Offroad;
        self.state.status.set(KartStatus::Offroad, offroad);

        let jitter = self.tuning.rumble_jitter;
        self.state.rumble = if offroad && jitter > 0.0 {
            self.rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
    }

    fn speed_modifier(&self, rubber_band: Option<RubberBand>) -> f32 {
        let d = &self.derived;
        let t = &self.tuning;

        let mut modifier = if self.state.is_sliding() {
            d.slide_speed_modifier
        } else {
            let turning = (self.state.turn_speed.abs() / d.max_turn_rate).min(1.0);
            1.0 + (d.turning_speed_modifier - 1.0) * turning
        };
        if self.state.is_wheelie() {
            modifier *= d.wheelie_speed_multiplier;
        }
        modifier *= self.state.slow_power;
        if self.state.is_offroad() {
            modifier *= t.offroad_multiplier + self.state.rumble;
        }
        if let (Some(ai), Some(band)) = (self.ai, rubber_band) {
            let strength = t.rubber_band_strength * ai.rubber_band_scale;
            modifier *= band.factor(strength, t.rubber_band_range);
        }
        modifier.max(0.0)
    }

    /// Clamped-rate integration toward the throttle/brake/friction target.
    fn update_speed(&mut self, dt: f32, input: &KartInput, rubber_band: Option<RubberBand>) {
        if self.state.is_airborne() {
            return;
        }
        let modifier = self.speed_modifier(rubber_band);
        let d = self.derived;
        let speed = self.state.speed;

        let (target, max_up, max_down) = match (input.accelerate, input.brake) {
            (true, false) => {
                let target = d.top_speed * modifier;
                let up = if speed < 0.0 { d.braking_rate } else { d.acceleration };
                let down = if speed > target {
                    self.tuning.overspeed_decay
                } else {
                    d.braking_rate
                };
                (target, up, down)
            }
            (false, true) => {
                let down = if speed > 0.0 {
                    d.braking_rate
                } else {
                    d.reverse_acceleration
                };
                (-d.reverse_top_speed * modifier, d.friction, down)
            }
            _ => (0.0, d.friction, d.friction),
        };

        let desired_rate = (target - speed) / dt;
        self.state.speed = speed + desired_rate.clamp(-max_down, max_up) * dt;
    }

    fn update_turn(&mut self, dt: f32, input: &KartInput) {
        let d = self.derived;
        let t = &self.tuning;
        let s = &mut self.state;

        let ratio = s.speed.abs() / d.top_speed;
        let authority = turn_authority(ratio, t.turn_peak_speed_ratio, t.high_speed_turn_authority);
        let reversing = if s.speed < 0.0 { -1.0 } else { 1.0 };

        // A slide started without steering takes the first committed direction.
        if s.is_sliding() && s.slide_direction == 0 {
            s.slide_direction = steer_direction(input.turn);
            if s.slide_direction != 0 {
                log::debug!("kart {:#x} slide direction {}", self.entity, s.slide_direction);
            }
        }

        let mut target = if s.is_sliding() && s.slide_direction != 0 {
            let dir = s.slide_direction as f32;
            // +1 steering into the slide, -1 counter-steering.
            let steer = input.turn * dir;
            let factor = d.slide_outward + (d.slide_inward - d.slide_outward) * (steer + 1.0) * 0.5;
            dir * d.max_turn_rate * factor
        } else {
            input.turn * d.max_turn_rate
        };
        target *= authority * reversing;
        if s.is_wheelie() {
            target *= t.wheelie_turn_multiplier;
        }

        s.turn_speed = approach(s.turn_speed, target, d.turn_acceleration * dt);
        s.heading = wrap_angle(s.heading + s.turn_speed * dt);

        if s.is_sliding() {
            s.slide_charge = (s.slide_charge + s.turn_speed.abs() * d.slide_charge_rate * dt)
                .min(t.max_slide_charge);
        }

        let swerve_target = if s.is_sliding() {
            s.slide_direction as f32 * t.max_swerve
        } else {
            input.turn * t.max_swerve * 0.5
        };
        s.swerve = approach(s.swerve, swerve_target, t.swerve_rate * dt);
    }

    /// Returns the vertical displacement for this tick.
    fn update_vertical(
        &mut self,
        dt: f32,
        input: &KartInput,
        track: &dyn TrackHeightProvider,
        position: &Vec3,
    ) -> f32 {
        let ground = track.height_at(position) + self.tuning.ride_height;
        let last_ground = self.state.last_ground_height.replace(ground);

        let hop = input.slide
            && !self.state.previous_slide_input
            && !self.state.is_airborne()
            && !self.state.is_sliding();
        if hop {
            self.state.vertical_speed = self.tuning.hop_speed;
            self.state.status.add(KartStatus::Airborne);
        }

        if !self.state.is_airborne() {
            let above = position.y - ground;
            if above > self.tuning.sticky_band {
                return self.take_off(dt);
            }
            if let Some(prev) = last_ground {
                self.state.ground_climb_rate = (ground - prev) / dt;
            }
            return ground - position.y;
        }

        self.state.vertical_speed -= self.tuning.gravity * dt;
        let next = position.y + self.state.vertical_speed * dt;
        if self.state.vertical_speed <= 0.0 && next <= ground {
            self.land(input, track, position);
            return ground - position.y;
        }
        self.state.vertical_speed * dt
    }

    fn take_off(&mut self, dt: f32) -> f32 {
        let t = &self.tuning;
        let s = &mut self.state;
        s.vertical_speed = s.ground_climb_rate.max(0.0) + t.takeoff_vertical_boost;
        s.speed *= t.takeoff_speed_boost;
        s.ground_climb_rate = 0.0;
        s.status.add(KartStatus::Airborne);

        log::debug!(
            "kart {:#x} took off at {:.2} m/s vertical",
            self.entity,
            s.vertical_speed
        );
        self.signals.push(KartSignal::TookOff);
        s.vertical_speed * dt
    }

    fn land(&mut self, input: &KartInput, track: &dyn TrackHeightProvider, position: &Vec3) {
        let s = &mut self.state;
        s.status.remove(KartStatus::Airborne);
        s.vertical_speed = 0.0;
        s.speed *= self.tuning.landing_speed_damping;
        self.signals.push(KartSignal::Landed);

        let can_slide = input.slide
            && s.speed.abs() >= self.tuning.min_slide_speed
            && !s.is_sliding()
            && track.surface_at(position) != Surface::Offroad;
        if can_slide {
            self.start_slide(steer_direction(input.turn));
        }
    }

    fn start_slide(&mut self, direction: i8) {
        self.set_wheelie(false);
        let s = &mut self.state;
        s.status.add(KartStatus::Sliding);
        s.slide_direction = direction;
        s.slide_charge = 0.0;
        log::debug!("kart {:#x} slide started ({direction})", self.entity);
        self.signals.push(KartSignal::SlideStarted { direction });
    }

    fn end_slide(&mut self) {
        let s = &mut self.state;
        s.status.remove(KartStatus::Sliding);
        s.slide_direction = 0;
        s.slide_charge = 0.0;
        self.signals.push(KartSignal::SlideEnded);
    }

    fn update_slide_exit(&mut self, input: &KartInput, suppressed: bool) {
        if !self.state.is_sliding() {
            return;
        }
        let exit = if self.state.speed.abs() < self.tuning.min_slide_speed {
            SlideExit::LowSpeed
        } else if self.state.is_offroad() {
            SlideExit::Offroad
        } else if !input.slide {
            SlideExit::Released
        } else {
            return;
        };

        let charge = self.state.slide_charge;
        self.end_slide();
        log::debug!(
            "kart {:#x} slide ended: {exit:?}, charge {charge:.2}",
            self.entity
        );

        if exit == SlideExit::Released && !suppressed && charge >= self.tuning.slide_boost_threshold
        {
            self.signals.push(KartSignal::SlideBoost { charge });
            self.boost(1.0 + self.tuning.slide_boost_scale * charge / self.tuning.max_slide_charge);
        }
    }

    fn commit_transform(
        &mut self,
        dt: f32,
        vertical_delta: f32,
        mut position: Vec3,
        tree: &mut TransformTree,
    ) {
        let t = &self.tuning;
        let s = &mut self.state;

        position += s.outside_force * dt;
        s.outside_force *= (dt * t.outside_force_decay_rate).exp();
        if s.outside_force.norm() < SPEED_EPS {
            s.outside_force = Vec3::zeros();
        }

        let forward = heading_forward(s.heading) * (s.speed * dt);
        position += Vec3::new(forward.x, vertical_delta, forward.z);

        let shake = s.spin_out.remaining() * t.spin_out_spin_rate;
        let yaw = s.heading + s.swerve + shake;
        let pitch = if s.is_wheelie() { -t.wheelie_pitch } else { 0.0 };
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), yaw)
            * Quat::from_axis_angle(&Vec3::x_axis(), pitch);

        tree.set_local_pose(self.node, position, rotation);
    }

    // ------------------------------------------------------------------------
    // Ability hooks
    // ------------------------------------------------------------------------

    /// Raise speed toward `max(speed, top_speed * power)`, with diminishing
    /// returns as the kart approaches top speed.
    pub fn boost(&mut self, power: f32) {
        if !power.is_finite() || power <= 0.0 {
            return;
        }
        let top = self.derived.top_speed;
        let speed = self.state.speed;
        let target = (top * power).max(speed);
        let ratio = (speed.abs() / top).clamp(0.0, 1.0);
        let gain = 1.0 - self.tuning.boost_falloff * ratio * ratio;
        self.state.speed = speed + (target - speed) * gain;
        self.signals.push(KartSignal::BoostStarted { power });
    }

    pub fn spin_out(&mut self, duration: f32) {
        self.set_wheelie(false);
        let scaled = duration * self.derived.durability_factor;
        if self.state.spin_out.extend(scaled) {
            self.signals.push(KartSignal::SpinOutStarted { duration: scaled });
        }
    }

    /// Multiply speed by `power` (in [0, 1]) for `duration` seconds. While
    /// already slowed, the stronger power wins.
    pub fn slow(&mut self, power: f32, duration: f32) {
        let power = power.clamp(0.0, 1.0);
        let scaled = duration * self.derived.durability_factor;
        let was_active = self.state.slow.is_active();
        let extended = self.state.slow.extend(scaled);
        if !was_active && !extended {
            return;
        }
        self.state.slow_power = if was_active {
            self.state.slow_power.min(power)
        } else {
            power
        };
        self.signals.push(KartSignal::SlowStarted {
            power: self.state.slow_power,
            duration: self.state.slow.remaining(),
        });
    }

    pub fn turn_lock(&mut self, duration: f32) {
        let scaled = duration * self.derived.durability_factor;
        if self.state.turn_lock.extend(scaled) {
            self.signals.push(KartSignal::TurnLockStarted { duration: scaled });
        }
    }

    /// Set the stacked armor plate count and re-derive the build stats.
    pub fn armor_plate(&mut self, stacks: u8) {
        self.sources.armor_plates = stacks;
        self.rederive();
        self.signals.push(KartSignal::ArmorChanged { stacks });
    }

    /// Wheelies can start only on the ground and outside a slide.
    pub fn wheelie_toggle(&mut self) {
        if self.state.is_wheelie() {
            self.set_wheelie(false);
        } else if !self.state.is_sliding() && !self.state.is_airborne() {
            self.set_wheelie(true);
        }
    }

    fn set_wheelie(&mut self, active: bool) {
        if self.state.is_wheelie() != active {
            self.state.status.set(KartStatus::Wheelie, active);
            self.signals.push(KartSignal::WheelieChanged { active });
        }
    }

    pub(super) fn state_mut(&mut self) -> &mut KartMovementState {
        &mut self.state
    }

    pub(super) fn push_signal(&mut self, signal: KartSignal) {
        self.signals.push(signal);
    }
}

/// -1, 0 or 1 for a steering value, with the dead zone mapping to 0.
fn steer_direction(turn: f32) -> i8 {
    if turn > TURN_DEADZONE {
        1
    } else if turn < -TURN_DEADZONE {
        -1
    } else {
        0
    }
}

/// Turning authority over speed ratio: zero at rest, 1.0 at `peak`, easing
/// to `high_speed` at top speed and beyond.
pub fn turn_authority(ratio: f32, peak: f32, high_speed: f32) -> f32 {
    let ratio = ratio.max(0.0);
    if ratio < peak {
        ratio / peak
    } else {
        let past_peak = ((ratio - peak) / (1.0 - peak)).min(1.0);
        1.0 + (high_speed - 1.0) * past_peak
    }
}
