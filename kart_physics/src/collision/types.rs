/*!
Collider records and contact reports exchanged between the registry, the
narrow-phase tests and the kart controllers.

This module contains no algorithms.
*/

use crate::{
    entity::EntityId,
    transform::TransformId,
    types::Vec3,
};

/// Closed set of collider shapes. Dispatch is a `match` on pairs of these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    /// Moving sphere (karts, projectiles).
    ///
    /// Non-physics spheres are detected and reported but receivers apply no response.
    Sphere { radius: f32, applies_physics: bool },
    /// Static, infinitely thin vertical rectangle.
    Wall {
        /// Surface normal in the owning node's local frame. Only the horizontal part is used.
        normal: Vec3,
        half_height: f32,
        half_width: f32,
    },
}

/// Shape discriminator carried in contact reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    Sphere,
    Wall,
}

impl ColliderShape {
    pub fn kind(&self) -> ColliderKind {
        match self {
            ColliderShape::Sphere { .. } => ColliderKind::Sphere,
            ColliderShape::Wall { .. } => ColliderKind::Wall,
        }
    }
}

/// A registered collider. The registry holds no ownership of the entity or node.
#[derive(Clone, Debug)]
pub struct Collider {
    pub entity: EntityId,
    /// Node the collider follows.
    pub node: TransformId,
    /// Offset from the node origin, in the node's frame.
    pub offset: Vec3,
    pub shape: ColliderShape,

    pub(super) world_center: Vec3,
    pub(super) previous_center: Vec3,
    pub(super) world_normal: Vec3,
    /// False until the first refresh, so `previous_center` starts equal to the centre.
    pub(super) primed: bool,
}

impl Collider {
    fn new(node: TransformId, offset: Vec3, shape: ColliderShape) -> Self {
        Self {
            entity: 0,
            node,
            offset,
            shape,
            world_center: Vec3::zeros(),
            previous_center: Vec3::zeros(),
            world_normal: Vec3::zeros(),
            primed: false,
        }
    }

    pub fn sphere(node: TransformId, offset: Vec3, radius: f32) -> Self {
        Self::new(
            node,
            offset,
            ColliderShape::Sphere {
                radius,
                applies_physics: true,
            },
        )
    }

    pub fn wall(
        node: TransformId,
        offset: Vec3,
        normal: Vec3,
        half_height: f32,
        half_width: f32,
    ) -> Self {
        Self::new(
            node,
            offset,
            ColliderShape::Wall {
                normal,
                half_height,
                half_width,
            },
        )
    }

    /// Mark a sphere as detect-only.
    pub fn non_physics(mut self) -> Self {
        if let ColliderShape::Sphere {
            applies_physics, ..
        } = &mut self.shape
        {
            *applies_physics = false;
        }
        self
    }

    pub fn kind(&self) -> ColliderKind {
        self.shape.kind()
    }

    /// World-space centre as of the last registry tick.
    pub fn world_center(&self) -> Vec3 {
        self.world_center
    }

    /// World-space centre as of the tick before that.
    pub fn previous_center(&self) -> Vec3 {
        self.previous_center
    }
}

/// World-space sphere as seen by one tick.
#[derive(Clone, Copy, Debug)]
pub struct SphereSnapshot {
    pub center: Vec3,
    pub previous: Vec3,
    pub radius: f32,
    pub applies_physics: bool,
}

/// World-space wall as seen by one tick.
#[derive(Clone, Copy, Debug)]
pub struct WallSnapshot {
    pub center: Vec3,
    pub normal: Vec3,
    pub half_height: f32,
    pub half_width: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) enum ShapeSnapshot {
    Sphere(SphereSnapshot),
    Wall(WallSnapshot),
}

/// Narrow-phase result, oriented toward the first shape of the test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub point: Vec3,
    /// Unit normal pointing from the other shape toward the first one.
    pub normal: Vec3,
    /// Distance the first shape must move along `normal` to separate.
    pub penetration: f32,
    /// The first shape's centre crossed the other shape since the last tick.
    pub passed_through: bool,
}

/// Contact delivered to the entity named in `entity`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactReport {
    /// Receiver of the report.
    pub entity: EntityId,
    pub other: EntityId,
    pub other_kind: ColliderKind,
    pub contact_point: Vec3,
    /// Unit normal pointing away from `other`, toward `entity`.
    pub normal: Vec3,
    pub penetration: f32,
    pub passed_through: bool,
    /// False when either side is a detect-only collider.
    pub applies_physics: bool,
}
