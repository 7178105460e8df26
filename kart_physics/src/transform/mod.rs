/*!
Hierarchical transforms (scene-graph nodes).

Nodes live in a [`TransformTree`] arena and reference each other by
[`TransformId`]. Each node owns its local scale/rotation/translation and
caches the derived world values behind dirty flags:

- A local mutation re-derives the node's world rotation/scale and pushes
  them down to every descendant (top-down, O(subtree)), marking each one dirty.
- World translation and the world matrix are recomputed lazily on read.
- `set_parent` pulls the new parent's world values as the inherited baseline.

Renderers and cameras read `world_matrix`/`world_translation`/`world_rotation`
once per frame; only the owning controller writes.
*/

mod node;
mod tree;

pub use node::{ChildPolicy, LocalTransform, TransformId, TransformNode};
pub use tree::TransformTree;
