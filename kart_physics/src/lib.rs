pub mod bitmask_flags;
pub mod collision;
pub mod constants;
pub mod entity;
pub mod kart;
pub mod projectile;
pub mod track;
pub mod transform;
pub mod types;
pub mod world;

pub use collision::{ColliderKind, ColliderRegistry, ContactReport, rotation_between};
pub use constants::{FIXED_DT_S, MAX_DT_S, TICK_HZ};
pub use entity::{EntityId, EntityKind, entity_kind, pack_entity, validate_entity_id};
pub use kart::{
    ConfigError, KartEvent, KartInput, KartMovementController, KartSignal, KartStats,
    KartTuning, StatSources,
};
pub use projectile::ProjectileBody;
pub use track::{FlatTrack, PatchTrack, Surface, TrackHeightProvider, TrackPatch};
pub use transform::{LocalTransform, TransformId, TransformTree};
pub use types::{Mat4, Quat, Vec3};
pub use world::{KartSpawn, RaceWorld};
