use slotmap::SlotMap;

use super::node::{ChildPolicy, Dirty, LocalTransform, TransformId, TransformNode};
use crate::types::{Mat4, Quat, Vec3};

/// Arena owning every [`TransformNode`] of a world.
///
/// Handles are generational, so a removed node's id never aliases a new node;
/// operations on stale ids are no-ops (setters) or return `None` (getters).
#[derive(Default)]
pub struct TransformTree {
    nodes: SlotMap<TransformId, TransformNode>,
}

impl TransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: TransformId) -> Option<&TransformNode> {
        self.nodes.get(id)
    }

    /// Insert a root node.
    pub fn insert(&mut self, local: LocalTransform) -> TransformId {
        self.nodes.insert(TransformNode::new(local))
    }

    /// Insert a node already parented to `parent`.
    pub fn insert_child(&mut self, parent: TransformId, local: LocalTransform) -> TransformId {
        let id = self.insert(local);
        self.set_parent(id, Some(parent));
        id
    }

    /// Remove `id`, detaching it from its parent. Children are orphaned or
    /// destroyed per `policy`.
    pub fn remove(&mut self, id: TransformId, policy: ChildPolicy) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.detach(id);

        let children = self
            .nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default();

        match policy {
            ChildPolicy::Orphan => {
                for child in children {
                    self.set_parent(child, None);
                }
            }
            ChildPolicy::Destroy => {
                let mut stack = children;
                while let Some(next) = stack.pop() {
                    if let Some(node) = self.nodes.remove(next) {
                        stack.extend(node.children);
                    }
                }
            }
        }

        self.nodes.remove(id);
    }

    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: TransformId) -> &[TransformId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Reparent `id` under `parent` (or make it a root with `None`).
    ///
    /// The new parent's current world values become the inherited baseline and
    /// the whole subtree is marked dirty.
    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) {
        if !self.nodes.contains_key(id) {
            return;
        }
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                log::warn!("set_parent: stale parent handle {p:?}, keeping {id:?} as root");
                return;
            }
            debug_assert!(
                p != id && !self.is_ancestor(id, p),
                "set_parent would create a cycle"
            );
        }

        self.detach(id);

        let baseline = match parent {
            Some(p) => {
                // Parent world values must be fresh before they are pulled.
                self.refresh(p);
                let pn = &self.nodes[p];
                (pn.world_scale, pn.world_rotation, pn.world_translation)
            }
            None => (Vec3::new(1.0, 1.0, 1.0), Quat::identity(), Vec3::zeros()),
        };

        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }

        let node = &mut self.nodes[id];
        node.parent = parent;
        node.inherited_scale = baseline.0;
        node.inherited_rotation = baseline.1;
        node.inherited_translation = baseline.2;
        node.dirty.add_many(&[Dirty::Scale, Dirty::Rotation, Dirty::Transform]);

        self.push_to_subtree(id);
    }

    pub fn local(&self, id: TransformId) -> Option<LocalTransform> {
        self.nodes.get(id).map(|n| n.local)
    }

    pub fn local_translation(&self, id: TransformId) -> Option<Vec3> {
        self.nodes.get(id).map(|n| n.local.translation)
    }

    pub fn local_rotation(&self, id: TransformId) -> Option<Quat> {
        self.nodes.get(id).map(|n| n.local.rotation)
    }

    pub fn local_scale(&self, id: TransformId) -> Option<Vec3> {
        self.nodes.get(id).map(|n| n.local.scale)
    }

    pub fn set_local_translation(&mut self, id: TransformId, translation: Vec3) {
        self.mutate(id, |l| l.translation = translation);
    }

    pub fn set_local_rotation(&mut self, id: TransformId, rotation: Quat) {
        self.mutate(id, |l| l.rotation = rotation);
    }

    pub fn set_local_scale(&mut self, id: TransformId, scale: Vec3) {
        self.mutate(id, |l| l.scale = scale);
    }

    /// Replace translation and rotation in one push.
    pub fn set_local_pose(&mut self, id: TransformId, translation: Vec3, rotation: Quat) {
        self.mutate(id, |l| {
            l.translation = translation;
            l.rotation = rotation;
        });
    }

    pub fn translate(&mut self, id: TransformId, delta: Vec3) {
        self.mutate(id, |l| l.translation += delta);
    }

    /// Compose Euler deltas (radians) onto the local rotation, X then Y then Z.
    pub fn rotate(&mut self, id: TransformId, euler: Vec3) {
        self.mutate(id, |l| {
            l.rotation *= Quat::from_axis_angle(&Vec3::x_axis(), euler.x);
            l.rotation *= Quat::from_axis_angle(&Vec3::y_axis(), euler.y);
            l.rotation *= Quat::from_axis_angle(&Vec3::z_axis(), euler.z);
        });
    }

    /// Component-wise multiply of the local scale.
    pub fn scale(&mut self, id: TransformId, factor: Vec3) {
        self.mutate(id, |l| l.scale = l.scale.component_mul(&factor));
    }

    pub fn world_translation(&mut self, id: TransformId) -> Option<Vec3> {
        self.refresh(id);
        self.nodes.get(id).map(|n| n.world_translation)
    }

    pub fn world_rotation(&mut self, id: TransformId) -> Option<Quat> {
        self.refresh(id);
        self.nodes.get(id).map(|n| n.world_rotation)
    }

    pub fn world_scale(&mut self, id: TransformId) -> Option<Vec3> {
        self.refresh(id);
        self.nodes.get(id).map(|n| n.world_scale)
    }

    pub fn world_matrix(&mut self, id: TransformId) -> Option<Mat4> {
        self.refresh(id);
        self.nodes.get(id).map(|n| n.world_matrix)
    }

    fn mutate(&mut self, id: TransformId, f: impl FnOnce(&mut LocalTransform)) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        f(&mut node.local);
        node.dirty.add_many(&[Dirty::Scale, Dirty::Rotation, Dirty::Transform]);
        self.push_to_subtree(id);
    }

    /// Re-derive rotation/scale of `root` and hand them down to every descendant,
    /// marking each one dirty. Translation/matrix stay dirty until read.
    fn push_to_subtree(&mut self, root: TransformId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.derive_rotation();
            node.derive_scale();
            node.dirty.add(Dirty::Transform);

            let (scale, rotation) = (node.world_scale, node.world_rotation);
            let children = node.children.clone();
            for child in children {
                if let Some(c) = self.nodes.get_mut(child) {
                    c.inherited_scale = scale;
                    c.inherited_rotation = rotation;
                    c.dirty.add_many(&[Dirty::Scale, Dirty::Rotation, Dirty::Transform]);
                    stack.push(child);
                }
            }
        }
    }

    /// Bring `id` and its ancestors up to date, root first.
    fn refresh(&mut self, id: TransformId) {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let Some(node) = self.nodes.get(cur) else {
                break;
            };
            chain.push(cur);
            cursor = node.parent;
        }

        let mut parent_translation: Option<Vec3> = None;
        for &cur in chain.iter().rev() {
            let node = &mut self.nodes[cur];
            if let Some(t) = parent_translation {
                if node.inherited_translation != t {
                    node.inherited_translation = t;
                    node.dirty.add(Dirty::Transform);
                }
            }
            if node.is_dirty() {
                node.derive_matrix();
            }
            parent_translation = Some(node.world_translation);
        }
    }

    fn detach(&mut self, id: TransformId) {
        let Some(old) = self.nodes.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(old) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: TransformId, of: TransformId) -> bool {
        let mut cursor = self.parent(of);
        while let Some(cur) = cursor {
            if cur == ancestor {
                return true;
            }
            cursor = self.parent(cur);
        }
        false
    }
}
