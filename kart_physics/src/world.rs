/*!
Race simulation root.

[`RaceWorld`] owns every piece of per-race state: the transform arena, the
collider registry, the kart controllers with their inboxes, live projectiles
and the track. One call to [`RaceWorld::tick`] advances the whole race:

1. drain each kart's inbox (abilities, last tick's contacts) in FIFO order
2. tick kart controllers in ascending entity order
3. tick projectiles, despawning expired ones
4. run the collider registry over the committed poses
5. queue this tick's contact reports into the receiving karts' inboxes

Contacts are therefore applied at the start of the following tick, before the
kart moves again, and no controller ever touches another kart directly.
*/

use std::collections::{HashMap, VecDeque};

use crate::{
    collision::{Collider, ColliderRegistry},
    constants::MAX_DT_S,
    entity::{EntityAllocator, EntityId, EntityKind, entity_kind, validate_entity_id},
    kart::{
        AiDriver, KartEnv, KartEvent, KartInput, KartMovementController, KartSignal, KartTuning,
        RubberBand, StatSources,
    },
    projectile::ProjectileBody,
    track::TrackHeightProvider,
    transform::{ChildPolicy, LocalTransform, TransformId, TransformTree},
    types::{Mat4, Quat, Vec3},
};

pub const DEFAULT_KART_RADIUS: f32 = 0.6;

/// Everything needed to put a kart on the grid.
#[derive(Clone, Copy, Debug)]
pub struct KartSpawn {
    pub position: Vec3,
    pub heading: f32,
    pub sources: StatSources,
    /// `None` for human-driven karts.
    pub ai: Option<AiDriver>,
    pub collider_radius: f32,
}

impl KartSpawn {
    pub fn new(position: Vec3, sources: StatSources) -> Self {
        Self {
            position,
            heading: 0.0,
            sources,
            ai: None,
            collider_radius: DEFAULT_KART_RADIUS,
        }
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_ai(mut self, ai: AiDriver) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.collider_radius = radius;
        self
    }
}

struct KartSlot {
    controller: KartMovementController,
    input: KartInput,
    inbox: VecDeque<KartEvent>,
    progress: f32,
}

pub struct RaceWorld {
    tree: TransformTree,
    colliders: ColliderRegistry,
    allocator: EntityAllocator,
    karts: HashMap<EntityId, KartSlot>,
    projectiles: HashMap<EntityId, ProjectileBody>,
    walls: HashMap<EntityId, TransformId>,
    track: Box<dyn TrackHeightProvider>,
    tuning: KartTuning,
    signals: Vec<(EntityId, KartSignal)>,
    countdown: bool,
    ticks: u64,
}

impl RaceWorld {
    pub fn new(track: Box<dyn TrackHeightProvider>, tuning: KartTuning) -> Self {
        Self {
            tree: TransformTree::new(),
            colliders: ColliderRegistry::new(),
            allocator: EntityAllocator::default(),
            karts: HashMap::new(),
            projectiles: HashMap::new(),
            walls: HashMap::new(),
            track,
            tuning,
            signals: Vec::new(),
            countdown: false,
            ticks: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    pub fn spawn_kart(&mut self, spawn: KartSpawn) -> EntityId {
        let id = self.allocator.allocate(EntityKind::Kart);
        let node = self.tree.insert(
            LocalTransform::from_translation(spawn.position)
                .with_rotation(Quat::from_axis_angle(&Vec3::y_axis(), spawn.heading)),
        );

        let mut controller =
            KartMovementController::new(id, node, spawn.sources, self.tuning.clone())
                .with_heading(spawn.heading);
        if let Some(ai) = spawn.ai {
            controller = controller.with_ai(ai);
        }
        controller.set_enabled(!self.countdown);

        self.colliders
            .register(id, Collider::sphere(node, Vec3::zeros(), spawn.collider_radius));
        self.karts.insert(
            id,
            KartSlot {
                controller,
                input: KartInput::NONE,
                inbox: VecDeque::new(),
                progress: 0.0,
            },
        );
        log::debug!("spawned kart {id:#x}");
        id
    }

    /// Remove a kart with its node and collider. Queued events are dropped.
    pub fn despawn_kart(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.karts.remove(&id) else {
            log::warn!("despawn of unknown kart {id:#x}");
            return false;
        };
        self.colliders.unregister(id);
        self.tree.remove(slot.controller.node(), ChildPolicy::Destroy);
        true
    }

    /// Add a static wall segment centred at `center`, facing `normal`.
    pub fn add_wall(
        &mut self,
        center: Vec3,
        normal: Vec3,
        half_height: f32,
        half_width: f32,
    ) -> EntityId {
        let id = self.allocator.allocate(EntityKind::Track);
        let node = self.tree.insert(LocalTransform::from_translation(center));
        self.colliders.register(
            id,
            Collider::wall(node, Vec3::zeros(), normal, half_height, half_width),
        );
        self.walls.insert(id, node);
        id
    }

    pub fn remove_wall(&mut self, id: EntityId) -> bool {
        let Some(node) = self.walls.remove(&id) else {
            return false;
        };
        self.colliders.unregister(id);
        self.tree.remove(node, ChildPolicy::Destroy);
        true
    }

    /// Launch a detect-only projectile.
    pub fn spawn_projectile(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        radius: f32,
        lifetime: f32,
    ) -> EntityId {
        let id = self.allocator.allocate(EntityKind::Projectile);
        let node = self.tree.insert(LocalTransform::from_translation(position));
        self.colliders
            .register(id, Collider::sphere(node, Vec3::zeros(), radius).non_physics());
        self.projectiles
            .insert(id, ProjectileBody::new(id, node, velocity, lifetime));
        id
    }

    pub fn despawn_projectile(&mut self, id: EntityId) -> bool {
        let Some(body) = self.projectiles.remove(&id) else {
            return false;
        };
        self.colliders.unregister(id);
        self.tree.remove(body.node(), ChildPolicy::Destroy);
        true
    }

    // ------------------------------------------------------------------------
    // Per-tick inputs
    // ------------------------------------------------------------------------

    pub fn set_input(&mut self, id: EntityId, input: KartInput) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.input = input.sanitized();
                true
            }
            None => false,
        }
    }

    /// Queue an event for the kart's next tick.
    pub fn send_event(&mut self, id: EntityId, event: KartEvent) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.inbox.push_back(event);
                true
            }
            None => false,
        }
    }

    /// Distance travelled along the race line, used for AI rubber banding.
    pub fn set_race_progress(&mut self, id: EntityId, progress: f32) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.progress = progress;
                true
            }
            None => false,
        }
    }

    /// While the countdown runs every kart ignores its input.
    pub fn set_countdown(&mut self, active: bool) {
        self.countdown = active;
        for slot in self.karts.values_mut() {
            slot.controller.set_enabled(!active);
        }
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut KartSlot> {
        if let Err(e) = validate_entity_id(id) {
            log::warn!("rejected id {id:#x}: {e}");
            return None;
        }
        if entity_kind(id) != Some(EntityKind::Kart) {
            log::warn!("id {id:#x} is not a kart");
            return None;
        }
        let slot = self.karts.get_mut(&id);
        if slot.is_none() {
            log::warn!("unknown kart {id:#x}");
        }
        slot
    }

    // ------------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------------

    /// Advance the race by `dt` seconds (clamped to [`MAX_DT_S`]).
    pub fn tick(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let dt = if dt > MAX_DT_S {
            log::warn!("tick dt {dt:.3}s clamped to {MAX_DT_S}s");
            MAX_DT_S
        } else {
            dt
        };

        let mut ids: Vec<EntityId> = self.karts.keys().copied().collect();
        ids.sort_unstable();

        for id in &ids {
            if let Some(slot) = self.karts.get_mut(id) {
                while let Some(event) = slot.inbox.pop_front() {
                    slot.controller.handle_event(event, &mut self.tree);
                }
            }
        }

        let field = self.human_field();
        for id in &ids {
            let Some(slot) = self.karts.get_mut(id) else {
                continue;
            };
            let rubber_band = field.map(|(lead, last)| RubberBand {
                own_progress: slot.progress,
                lead_human_progress: lead,
                last_human_progress: last,
            });
            let mut env = KartEnv {
                tree: &mut self.tree,
                track: self.track.as_ref(),
                rubber_band,
            };
            slot.controller.tick(dt, slot.input, &mut env);
        }

        self.tick_projectiles(dt);

        let reports = self.colliders.tick(&mut self.tree);
        log::trace!("tick {}: {} contact reports", self.ticks, reports.len());
        for report in reports {
            if let Some(slot) = self.karts.get_mut(&report.entity) {
                slot.inbox.push_back(KartEvent::Contact(report));
            }
        }

        for id in &ids {
            if let Some(slot) = self.karts.get_mut(id) {
                self.signals
                    .extend(slot.controller.drain_signals().into_iter().map(|s| (*id, s)));
            }
        }
        self.ticks += 1;
    }

    fn tick_projectiles(&mut self, dt: f32) {
        let mut ids: Vec<EntityId> = self.projectiles.keys().copied().collect();
        ids.sort_unstable();

        let mut expired = Vec::new();
        for id in ids {
            if let Some(body) = self.projectiles.get_mut(&id) {
                if !body.tick(dt, &mut self.tree, self.track.as_ref()) {
                    expired.push(id);
                }
            }
        }
        for id in expired {
            log::debug!("projectile {id:#x} expired");
            self.despawn_projectile(id);
        }
    }

    /// `(lead, last)` race progress over human karts, if any.
    fn human_field(&self) -> Option<(f32, f32)> {
        self.karts
            .values()
            .filter(|slot| !slot.controller.is_ai())
            .map(|slot| slot.progress)
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((lead, last)) => Some((lead.max(p), last.min(p))),
            })
    }

    pub fn drain_signals(&mut self) -> Vec<(EntityId, KartSignal)> {
        std::mem::take(&mut self.signals)
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn kart(&self, id: EntityId) -> Option<&KartMovementController> {
        self.karts.get(&id).map(|slot| &slot.controller)
    }

    /// Kart ids in ascending order.
    pub fn kart_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.karts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn projectile(&self, id: EntityId) -> Option<&ProjectileBody> {
        self.projectiles.get(&id)
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn pending_events(&self, id: EntityId) -> usize {
        self.karts.get(&id).map_or(0, |slot| slot.inbox.len())
    }

    pub fn kart_position(&self, id: EntityId) -> Option<Vec3> {
        let slot = self.karts.get(&id)?;
        self.tree.local_translation(slot.controller.node())
    }

    pub fn world_matrix(&mut self, id: EntityId) -> Option<Mat4> {
        let node = self.node_of(id)?;
        self.tree.world_matrix(node)
    }

    fn node_of(&self, id: EntityId) -> Option<TransformId> {
        match entity_kind(id)? {
            EntityKind::Kart => self.karts.get(&id).map(|slot| slot.controller.node()),
            EntityKind::Projectile => self.projectiles.get(&id).map(|body| body.node()),
            EntityKind::Track => self.walls.get(&id).copied(),
            EntityKind::Item => None,
        }
    }

    pub fn colliders(&self) -> &ColliderRegistry {
        &self.colliders
    }

    pub fn tree(&self) -> &TransformTree {
        &self.tree
    }

    /// Mutable tree access for attaching child nodes (wheels, drivers,
    /// cameras) under kart nodes.
    pub fn tree_mut(&mut self) -> &mut TransformTree {
        &mut self.tree
    }

    pub fn tuning(&self) -> &KartTuning {
        &self.tuning
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kart::KartStats, track::FlatTrack};

    fn world() -> RaceWorld {
        RaceWorld::new(Box::new(FlatTrack::default()), KartTuning::default())
    }

    fn sources() -> StatSources {
        StatSources::new(KartStats::new(5, 5, 5, 1), KartStats::default())
    }

    #[test]
    fn spawn_and_despawn_cleans_up() {
        let mut world = world();
        let id = world.spawn_kart(KartSpawn::new(Vec3::new(1.0, 0.5, 2.0), sources()));

        assert_eq!(entity_kind(id), Some(EntityKind::Kart));
        assert_eq!(world.kart_position(id), Some(Vec3::new(1.0, 0.5, 2.0)));
        assert_eq!(world.colliders().len(), 1);
        assert_eq!(world.tree().len(), 1);

        assert!(world.despawn_kart(id));
        assert!(world.kart(id).is_none());
        assert!(world.colliders().is_empty());
        assert!(world.tree().is_empty());
        assert!(!world.despawn_kart(id));
    }

    #[test]
    fn remove_wall_drops_collider_and_node() {
        let mut world = world();
        let wall = world.add_wall(Vec3::new(0.0, 1.0, 5.0), -Vec3::z(), 1.0, 4.0);
        assert_eq!(entity_kind(wall), Some(EntityKind::Track));
        assert!(world.colliders().get(wall).is_some());
        assert_eq!(world.tree().len(), 1);

        assert!(world.remove_wall(wall));
        assert!(world.colliders().get(wall).is_none());
        assert!(world.tree().is_empty());
        assert!(!world.remove_wall(wall));
    }

    #[test]
    fn unknown_or_foreign_ids_are_rejected() {
        let mut world = world();
        let kart = world.spawn_kart(KartSpawn::new(Vec3::zeros(), sources()));
        let wall = world.add_wall(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0);

        assert!(world.set_input(kart, KartInput::throttle()));
        assert!(!world.set_input(wall, KartInput::throttle()));
        assert!(!world.send_event(kart | (1u64 << 60), KartEvent::WheelieToggle));
        assert!(!world.set_race_progress(kart + 1, 10.0));
    }

    #[test]
    fn countdown_holds_karts_in_place() {
        let mut world = world();
        world.set_countdown(true);
        let id = world.spawn_kart(KartSpawn::new(Vec3::new(0.0, 0.5, 0.0), sources()));
        world.set_input(id, KartInput::throttle());

        for _ in 0..30 {
            world.tick(1.0 / 60.0);
        }
        assert_eq!(world.kart(id).unwrap().state().speed, 0.0);

        world.set_countdown(false);
        world.tick(1.0 / 60.0);
        assert!(world.kart(id).unwrap().state().speed > 0.0);
    }

    #[test]
    fn events_apply_in_fifo_order_next_tick() {
        let mut world = world();
        let id = world.spawn_kart(KartSpawn::new(Vec3::new(0.0, 0.5, 0.0), sources()));

        world.send_event(id, KartEvent::WheelieToggle);
        world.send_event(id, KartEvent::WheelieToggle);
        world.send_event(id, KartEvent::Boost { power: 1.0 });
        assert_eq!(world.pending_events(id), 3);

        world.tick(1.0 / 60.0);
        assert_eq!(world.pending_events(id), 0);
        let signals: Vec<KartSignal> = world.drain_signals().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            &signals[..3],
            &[
                KartSignal::WheelieChanged { active: true },
                KartSignal::WheelieChanged { active: false },
                KartSignal::BoostStarted { power: 1.0 },
            ]
        );
    }

    #[test]
    fn expired_projectiles_are_despawned() {
        let mut world = world();
        let velocity = Vec3::new(0.0, 0.0, 10.0);
        let id = world.spawn_projectile(Vec3::new(0.0, 0.3, 0.0), velocity, 0.3, 0.5);
        assert!(world.projectile(id).is_some());
        assert_eq!(world.colliders().len(), 1);

        for _ in 0..40 {
            world.tick(1.0 / 60.0);
        }
        assert!(world.projectile(id).is_none());
        assert_eq!(world.projectile_count(), 0);
        assert!(world.colliders().is_empty());
        assert!(world.tree().is_empty());
    }

    #[test]
    fn oversized_dt_is_clamped() {
        let mut world = world();
        let id = world.spawn_kart(KartSpawn::new(Vec3::new(0.0, 0.5, 0.0), sources()));
        world.set_input(id, KartInput::throttle());

        world.tick(5.0);
        let speed = world.kart(id).unwrap().state().speed;
        assert!((speed - 12.0 * MAX_DT_S).abs() < 1.0e-4);

        world.tick(f32::NAN);
        world.tick(-1.0);
        assert_eq!(world.tick_count(), 1);
    }
}
