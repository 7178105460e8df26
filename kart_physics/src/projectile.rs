//! Thrown items: constant horizontal velocity, hovering over the track, with
//! a fixed lifetime.
//!
//! Projectiles never push anything. Their collider is detect-only, so a hit
//! kart receives a contact with `applies_physics = false` and the ability
//! that threw the item decides the effect.

use crate::{
    entity::EntityId,
    track::TrackHeightProvider,
    transform::{TransformId, TransformTree},
    types::{Quat, Vec3, to_planar},
};

pub const DEFAULT_HOVER_HEIGHT: f32 = 0.3;
pub const PROJECTILE_GRAVITY: f32 = 30.0;

#[derive(Clone, Debug)]
pub struct ProjectileBody {
    entity: EntityId,
    node: TransformId,
    velocity: Vec3,
    vertical_speed: f32,
    hover_height: f32,
    remaining: f32,
    grounded: bool,
}

impl ProjectileBody {
    /// `velocity` is flattened to the horizontal plane.
    pub fn new(entity: EntityId, node: TransformId, velocity: Vec3, lifetime: f32) -> Self {
        Self {
            entity,
            node,
            velocity: to_planar(velocity),
            vertical_speed: 0.0,
            hover_height: DEFAULT_HOVER_HEIGHT,
            remaining: lifetime.max(0.0),
            grounded: false,
        }
    }

    pub fn with_hover_height(mut self, hover_height: f32) -> Self {
        self.hover_height = hover_height.max(0.0);
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn node(&self) -> TransformId {
        self.node
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn remaining_lifetime(&self) -> f32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Advance one tick. Returns false once the lifetime has run out or the
    /// node is gone; the owner despawns the projectile then.
    pub fn tick(
        &mut self,
        dt: f32,
        tree: &mut TransformTree,
        track: &dyn TrackHeightProvider,
    ) -> bool {
        let Some(position) = tree.local_translation(self.node) else {
            log::warn!("projectile {:#x} has no transform node", self.entity);
            return false;
        };
        self.remaining = (self.remaining - dt).max(0.0);
        if self.is_expired() {
            return false;
        }

        let mut next = position + self.velocity * dt;
        let ground = track.height_at(&next) + self.hover_height;

        if next.y <= ground {
            // On or below the hover height: ride the surface.
            next.y = ground;
            self.vertical_speed = 0.0;
            self.grounded = true;
        } else {
            self.vertical_speed -= PROJECTILE_GRAVITY * dt;
            next.y += self.vertical_speed * dt;
            if next.y <= ground {
                next.y = ground;
                self.vertical_speed = 0.0;
            }
            self.grounded = next.y <= ground;
        }

        let yaw = self.velocity.x.atan2(self.velocity.z);
        tree.set_local_pose(self.node, next, Quat::from_axis_angle(&Vec3::y_axis(), yaw));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{EntityKind, pack_entity},
        track::{FlatTrack, PatchTrack, TrackPatch},
        transform::LocalTransform,
    };

    const DT: f32 = 1.0 / 60.0;

    fn spawn(tree: &mut TransformTree, at: Vec3, velocity: Vec3, lifetime: f32) -> ProjectileBody {
        let node = tree.insert(LocalTransform::from_translation(at));
        ProjectileBody::new(pack_entity(1, EntityKind::Projectile), node, velocity, lifetime)
    }

    #[test]
    fn slides_along_the_track_at_hover_height() {
        let mut tree = TransformTree::new();
        let track = FlatTrack { height: 2.0 };
        let mut body = spawn(&mut tree, Vec3::new(0.0, 2.3, 0.0), Vec3::new(0.0, 5.0, 12.0), 5.0);
        assert_eq!(body.velocity(), Vec3::new(0.0, 0.0, 12.0));

        for _ in 0..60 {
            assert!(body.tick(DT, &mut tree, &track));
        }
        let position = tree.local_translation(body.node()).unwrap();
        assert!((position.z - 12.0).abs() < 1.0e-3);
        assert!((position.y - 2.3).abs() < 1.0e-5);
        assert!(body.is_grounded());
    }

    #[test]
    fn climbs_slopes_and_falls_off_ledges() {
        let mut tree = TransformTree::new();
        let track = PatchTrack::new(-10.0)
            .with_patch(TrackPatch::flat([-5.0, 0.0], [5.0, 10.0], 0.0).with_gradient([0.0, 0.5]));
        let mut body = spawn(&mut tree, Vec3::new(0.0, 0.3, 0.0), Vec3::new(0.0, 0.0, 10.0), 5.0);

        for _ in 0..30 {
            body.tick(DT, &mut tree, &track);
        }
        let position = tree.local_translation(body.node()).unwrap();
        assert!((position.y - (0.5 * position.z + 0.3)).abs() < 1.0e-4);

        for _ in 0..45 {
            body.tick(DT, &mut tree, &track);
        }
        assert!(!body.is_grounded(), "projectile should be falling past the end of the ramp");
        let position = tree.local_translation(body.node()).unwrap();
        assert!(position.y > -9.7);
    }

    #[test]
    fn custom_hover_height_settles_after_falling() {
        let mut tree = TransformTree::new();
        let track = FlatTrack::default();
        let mut body = spawn(&mut tree, Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 0.0, 4.0), 5.0)
            .with_hover_height(1.0);
        assert!(!body.is_grounded());

        for _ in 0..60 {
            assert!(body.tick(DT, &mut tree, &track));
        }
        assert!(body.is_grounded());
        let position = tree.local_translation(body.node()).unwrap();
        assert!((position.y - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn expires_after_lifetime() {
        let mut tree = TransformTree::new();
        let track = FlatTrack::default();
        let mut body = spawn(&mut tree, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 0.1);

        let mut alive_ticks = 0;
        while body.tick(DT, &mut tree, &track) {
            alive_ticks += 1;
            assert!(alive_ticks < 10);
        }
        assert!(body.is_expired());
        assert!((5..=6).contains(&alive_ticks));
    }
}
