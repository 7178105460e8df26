use crate::{
    bitmask_flags::BitmaskFlags,
    define_bitmask_flags,
    types::{Mat4, Quat, Vec3},
};

slotmap::new_key_type! {
    /// Stable handle to a node inside a [`super::TransformTree`].
    pub struct TransformId;
}

define_bitmask_flags!(
    /// Cached world values that must be re-derived before the next read.
    Dirty, u8, {
        Scale,
        Rotation,
        Transform,
    }
);

/// What happens to the children of a removed node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Children are detached and become roots.
    Orphan,
    /// The whole subtree is removed.
    Destroy,
}

/// Local (parent-relative) scale, rotation and translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl LocalTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Homogeneous matrix `T * R * S` of this local transform alone.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// A scene-graph node. Lives inside a [`super::TransformTree`] arena.
#[derive(Clone, Debug)]
pub struct TransformNode {
    pub(super) local: LocalTransform,

    pub(super) parent: Option<TransformId>,
    /// Back-references only; the tree owns every node.
    pub(super) children: Vec<TransformId>,

    // Parent world values last pushed down to this node.
    pub(super) inherited_scale: Vec3,
    pub(super) inherited_rotation: Quat,
    pub(super) inherited_translation: Vec3,

    pub(super) world_scale: Vec3,
    pub(super) world_rotation: Quat,
    pub(super) world_translation: Vec3,
    pub(super) world_matrix: Mat4,

    pub(super) dirty: BitmaskFlags<u8>,
}

impl TransformNode {
    pub(super) fn new(local: LocalTransform) -> Self {
        Self {
            local,
            parent: None,
            children: Vec::new(),
            inherited_scale: Vec3::new(1.0, 1.0, 1.0),
            inherited_rotation: Quat::identity(),
            inherited_translation: Vec3::zeros(),
            world_scale: local.scale,
            world_rotation: local.rotation,
            world_translation: local.translation,
            world_matrix: local.to_matrix(),
            dirty: BitmaskFlags::from_tags(&[Dirty::Scale, Dirty::Rotation, Dirty::Transform]),
        }
    }

    pub fn local(&self) -> &LocalTransform {
        &self.local
    }

    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    pub fn children(&self) -> &[TransformId] {
        &self.children
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// World rotation = parent world rotation × local rotation.
    pub(super) fn derive_rotation(&mut self) {
        self.world_rotation = self.inherited_rotation * self.local.rotation;
        self.dirty.remove(Dirty::Rotation);
    }

    /// World scale = parent world scale ⊙ local scale.
    pub(super) fn derive_scale(&mut self) {
        self.world_scale = self.inherited_scale.component_mul(&self.local.scale);
        self.dirty.remove(Dirty::Scale);
    }

    /// Rebuild the world matrix from the inherited baseline.
    ///
    /// Order: local scale, local rotation about the node origin, then the local
    /// translation (scaled by the parent) orbits the parent pivot by the parent
    /// rotation, then the parent translation is applied. World translation is
    /// read back out of the matrix.
    pub(super) fn derive_matrix(&mut self) {
        if self.dirty.has(Dirty::Rotation) {
            self.derive_rotation();
        }
        if self.dirty.has(Dirty::Scale) {
            self.derive_scale();
        }

        let orbit = self.inherited_rotation
            * self.inherited_scale.component_mul(&self.local.translation);

        self.world_matrix = Mat4::new_translation(&(self.inherited_translation + orbit))
            * self.world_rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.world_scale);

        self.world_translation = self.world_matrix.fixed_view::<3, 1>(0, 3).into_owned();
        self.dirty.remove(Dirty::Transform);
    }
}
