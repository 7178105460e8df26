use std::collections::HashMap;

use super::{
    narrow_phase::{sphere_sphere, sphere_wall},
    types::{
        Collider, ColliderKind, ColliderShape, ContactReport, ShapeSnapshot, SphereSnapshot,
        WallSnapshot,
    },
};
use crate::{entity::EntityId, transform::TransformTree};

/// World-owned table of colliders keyed by entity.
///
/// Pair enumeration is O(n²). Races have at most a handful of karts plus the
/// walls near them, so no spatial partitioning is done.
#[derive(Default)]
pub struct ColliderRegistry {
    colliders: HashMap<EntityId, Collider>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the collider owned by `entity`.
    pub fn register(&mut self, entity: EntityId, mut collider: Collider) {
        collider.entity = entity;
        if self.colliders.insert(entity, collider).is_some() {
            log::debug!("collider for entity {entity:#x} replaced");
        }
    }

    pub fn unregister(&mut self, entity: EntityId) -> Option<Collider> {
        self.colliders.remove(&entity)
    }

    pub fn get(&self, entity: EntityId) -> Option<&Collider> {
        self.colliders.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Forget the previous position of `entity`, e.g. after a respawn teleport,
    /// so the next tick cannot report a pass-through.
    pub fn reset_history(&mut self, entity: EntityId) {
        if let Some(c) = self.colliders.get_mut(&entity) {
            c.primed = false;
        }
    }

    /// Refresh every collider from the transform tree, then test every
    /// unordered pair against that one snapshot.
    ///
    /// Sphere–sphere contacts are reported to both spheres; sphere–wall
    /// contacts only to the sphere. Wall–wall pairs are skipped. Reports are
    /// ordered by ascending entity id pair.
    pub fn tick(&mut self, tree: &mut TransformTree) -> Vec<ContactReport> {
        let snapshot = self.refresh(tree);
        let mut reports = Vec::new();

        for (i, (a_id, a)) in snapshot.iter().enumerate() {
            for (b_id, b) in &snapshot[i + 1..] {
                match (a, b) {
                    (ShapeSnapshot::Sphere(sa), ShapeSnapshot::Sphere(sb)) => {
                        if let Some(hit) = sphere_sphere(sa, sb) {
                            let applies_physics = sa.applies_physics && sb.applies_physics;
                            reports.push(ContactReport {
                                entity: *a_id,
                                other: *b_id,
                                other_kind: ColliderKind::Sphere,
                                contact_point: hit.point,
                                normal: hit.normal,
                                penetration: hit.penetration,
                                passed_through: false,
                                applies_physics,
                            });
                            reports.push(ContactReport {
                                entity: *b_id,
                                other: *a_id,
                                other_kind: ColliderKind::Sphere,
                                contact_point: hit.point,
                                normal: -hit.normal,
                                penetration: hit.penetration,
                                passed_through: false,
                                applies_physics,
                            });
                        }
                    }
                    (ShapeSnapshot::Sphere(s), ShapeSnapshot::Wall(w)) => {
                        reports.extend(sphere_wall_report(*a_id, s, *b_id, w));
                    }
                    (ShapeSnapshot::Wall(w), ShapeSnapshot::Sphere(s)) => {
                        reports.extend(sphere_wall_report(*b_id, s, *a_id, w));
                    }
                    (ShapeSnapshot::Wall(_), ShapeSnapshot::Wall(_)) => {}
                }
            }
        }

        log::trace!(
            "collision tick: {} colliders, {} reports",
            snapshot.len(),
            reports.len()
        );
        reports
    }

    /// Pull world positions from the tree and capture them, sorted by entity id.
    fn refresh(&mut self, tree: &mut TransformTree) -> Vec<(EntityId, ShapeSnapshot)> {
        let mut snapshot = Vec::with_capacity(self.colliders.len());

        for (&entity, collider) in self.colliders.iter_mut() {
            let (Some(translation), Some(rotation)) = (
                tree.world_translation(collider.node),
                tree.world_rotation(collider.node),
            ) else {
                log::warn!("collider {entity:#x} follows a removed transform, skipping");
                continue;
            };

            let center = translation + rotation * collider.offset;
            collider.previous_center = if collider.primed {
                collider.world_center
            } else {
                center
            };
            collider.world_center = center;
            collider.primed = true;

            let shape = match collider.shape {
                ColliderShape::Sphere {
                    radius,
                    applies_physics,
                } => ShapeSnapshot::Sphere(SphereSnapshot {
                    center,
                    previous: collider.previous_center,
                    radius,
                    applies_physics,
                }),
                ColliderShape::Wall {
                    normal,
                    half_height,
                    half_width,
                } => {
                    collider.world_normal = rotation * normal;
                    ShapeSnapshot::Wall(WallSnapshot {
                        center,
                        normal: collider.world_normal,
                        half_height,
                        half_width,
                    })
                }
            };
            snapshot.push((entity, shape));
        }

        snapshot.sort_unstable_by_key(|(id, _)| *id);
        snapshot
    }
}

fn sphere_wall_report(
    sphere_id: EntityId,
    sphere: &SphereSnapshot,
    wall_id: EntityId,
    wall: &WallSnapshot,
) -> Option<ContactReport> {
    let hit = sphere_wall(sphere, wall)?;
    Some(ContactReport {
        entity: sphere_id,
        other: wall_id,
        other_kind: ColliderKind::Wall,
        contact_point: hit.point,
        normal: hit.normal,
        penetration: hit.penetration,
        passed_through: hit.passed_through,
        applies_physics: sphere.applies_physics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{EntityKind, pack_entity},
        transform::LocalTransform,
        types::{Quat, Vec3},
    };
    use std::f32::consts::FRAC_PI_2;

    fn kart(i: u64) -> EntityId {
        pack_entity(i, EntityKind::Kart)
    }

    fn track(i: u64) -> EntityId {
        pack_entity(i, EntityKind::Track)
    }

    #[test]
    fn sphere_pair_reports_both_sides() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let a = tree.insert(LocalTransform::from_translation(Vec3::new(0.0, 0.0, 0.0)));
        let b = tree.insert(LocalTransform::from_translation(Vec3::new(1.5, 0.0, 0.0)));
        registry.register(kart(0), Collider::sphere(a, Vec3::zeros(), 1.0));
        registry.register(kart(1), Collider::sphere(b, Vec3::zeros(), 1.0));

        let reports = registry.tick(&mut tree);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].entity, kart(0));
        assert_eq!(reports[0].other, kart(1));
        assert!((reports[0].normal + Vec3::x()).norm() < 1.0e-6);
        assert_eq!(reports[1].entity, kart(1));
        assert!((reports[1].normal - Vec3::x()).norm() < 1.0e-6);

        tree.set_local_translation(b, Vec3::new(2.1, 0.0, 0.0));
        assert!(registry.tick(&mut tree).is_empty());
    }

    #[test]
    fn collider_offset_follows_node_rotation() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let body = tree.insert(
            LocalTransform::default()
                .with_rotation(Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2)),
        );
        registry.register(kart(0), Collider::sphere(body, Vec3::new(0.0, 0.0, 2.0), 0.5));
        registry.tick(&mut tree);

        let center = registry.get(kart(0)).unwrap().world_center();
        assert!((center - Vec3::new(2.0, 0.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn walls_only_report_to_spheres() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let wall_node = tree.insert(LocalTransform::default());
        registry.register(track(0), Collider::wall(wall_node, Vec3::zeros(), Vec3::x(), 1.0, 5.0));
        registry.register(track(1), Collider::wall(wall_node, Vec3::zeros(), Vec3::z(), 1.0, 5.0));

        let kart_node = tree.insert(LocalTransform::from_translation(Vec3::new(0.5, 0.0, 3.0)));
        registry.register(kart(0), Collider::sphere(kart_node, Vec3::zeros(), 1.0));

        let reports = registry.tick(&mut tree);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].entity, kart(0));
        assert_eq!(reports[0].other, track(0));
        assert_eq!(reports[0].other_kind, ColliderKind::Wall);
        assert!((reports[0].penetration - 0.5).abs() < 1.0e-5);
    }

    #[test]
    fn previous_position_enables_pass_through() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let wall_node = tree.insert(LocalTransform::default());
        registry.register(track(0), Collider::wall(wall_node, Vec3::zeros(), Vec3::x(), 1.0, 5.0));
        let kart_node = tree.insert(LocalTransform::from_translation(Vec3::new(3.0, 0.0, 0.0)));
        registry.register(kart(0), Collider::sphere(kart_node, Vec3::zeros(), 0.5));

        assert!(registry.tick(&mut tree).is_empty());

        tree.set_local_translation(kart_node, Vec3::new(-3.0, 0.0, 0.0));
        let reports = registry.tick(&mut tree);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].passed_through);
        assert!((reports[0].normal - Vec3::x()).norm() < 1.0e-6);

        // A teleport with history reset is not a pass-through.
        tree.set_local_translation(kart_node, Vec3::new(3.0, 0.0, 0.0));
        registry.reset_history(kart(0));
        assert!(registry.tick(&mut tree).is_empty());
    }

    #[test]
    fn non_physics_spheres_are_reported_without_response() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let a = tree.insert(LocalTransform::default());
        let b = tree.insert(LocalTransform::from_translation(Vec3::new(0.5, 0.0, 0.0)));
        registry.register(kart(0), Collider::sphere(a, Vec3::zeros(), 1.0));
        registry.register(
            pack_entity(0, EntityKind::Projectile),
            Collider::sphere(b, Vec3::zeros(), 0.3).non_physics(),
        );

        let reports = registry.tick(&mut tree);
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.applies_physics));
    }

    #[test]
    fn unregister_and_stale_nodes_drop_out() {
        let mut tree = TransformTree::new();
        let mut registry = ColliderRegistry::new();

        let a = tree.insert(LocalTransform::default());
        let b = tree.insert(LocalTransform::default());
        registry.register(kart(0), Collider::sphere(a, Vec3::zeros(), 1.0));
        registry.register(kart(1), Collider::sphere(b, Vec3::zeros(), 1.0));
        assert_eq!(registry.tick(&mut tree).len(), 2);

        tree.remove(b, crate::transform::ChildPolicy::Orphan);
        assert!(registry.tick(&mut tree).is_empty());

        assert!(registry.unregister(kart(1)).is_some());
        assert_eq!(registry.len(), 1);
    }
}
