/*!
Collision root module.

Discrete, per-tick contact detection between moving spheres (karts,
projectiles) and static walls. The code is split for clarity:

- types:        collider records, per-tick snapshots and contact reports
- settings:     geometric tolerances
- narrow_phase: sphere–sphere and sphere–wall tests, `rotation_between`
- registry:     the world-owned collider table and its pairwise tick

Detection only reports contacts. Response policy (push-out, bounce, speed
loss) belongs to the kart controller that receives the report.
*/

pub mod narrow_phase;
pub mod registry;
pub mod settings;
pub mod types;

pub use narrow_phase::{effective_radius, rotation_between, sphere_sphere, sphere_wall};
pub use registry::ColliderRegistry;
pub use types::{
    Collider, ColliderKind, ColliderShape, Contact, ContactReport, SphereSnapshot, WallSnapshot,
};
