/// Identifier for anything that can own a transform or a collider (karts, track
/// walls, projectiles, item boxes).
///
/// # Bit layout
/// This `u64` is a packed value (least-significant bit = bit 0):
///
/// - bits 0..=47  : per-kind index
/// - bits 48..=55 : [`EntityKind`] tag (u8)
/// - bits 56..=63 : reserved (must be zero)
///
/// # Invariants
/// - Two different `(index, kind)` pairs never produce the same `EntityId`.
/// - Reserved bits stay zero.
pub type EntityId = u64;

/// The per-kind part of an [`EntityId`].
pub type EntityIndex = u64;

const INDEX_BITS: u32 = 48;
const INDEX_MASK: u64 = (1u64 << INDEX_BITS) - 1;
const KIND_MASK: u64 = u8::MAX as u64;
const RESERVED_MASK: u64 = !0u64 << 56;

/// Discriminator for the kind of entity referenced by an [`EntityId`].
///
/// The numeric values are part of the packed id. Do not reorder or reuse them.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Kart = 1,
    Track = 2,
    Projectile = 3,
    Item = 4,
}

/// Packs an [`EntityKind`] and a per-kind index into an [`EntityId`].
///
/// Indices wider than 48 bits are truncated.
pub fn pack_entity(index: EntityIndex, kind: EntityKind) -> EntityId {
    debug_assert!(index <= INDEX_MASK, "entity index {index} overflows 48 bits");
    (index & INDEX_MASK) | ((kind as u64) << INDEX_BITS)
}

/// Extracts the [`EntityKind`] from an [`EntityId`].
///
/// Returns `None` for unknown tags (corrupted ids or kinds from a newer build).
pub fn entity_kind(id: EntityId) -> Option<EntityKind> {
    match ((id >> INDEX_BITS) & KIND_MASK) as u8 {
        1u8 => Some(EntityKind::Kart),
        2u8 => Some(EntityKind::Track),
        3u8 => Some(EntityKind::Projectile),
        4u8 => Some(EntityKind::Item),
        _ => None,
    }
}

/// Extracts the per-kind index. Does not validate the kind tag.
pub fn entity_index(id: EntityId) -> EntityIndex {
    id & INDEX_MASK
}

/// Validates that an [`EntityId`] conforms to the packing contract.
pub fn validate_entity_id(id: EntityId) -> Result<(), &'static str> {
    if (id & RESERVED_MASK) != 0 {
        return Err("EntityId reserved bits are non-zero");
    }
    if entity_kind(id).is_none() {
        return Err("EntityId has unknown kind tag");
    }
    Ok(())
}

/// Hands out sequential ids per kind.
#[derive(Debug, Default, Clone)]
pub struct EntityAllocator {
    next: [EntityIndex; 4],
}

impl EntityAllocator {
    pub fn allocate(&mut self, kind: EntityKind) -> EntityId {
        let slot = &mut self.next[kind as usize - 1];
        let id = pack_entity(*slot, kind);
        *slot += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpacks_index_and_kind() {
        let kinds = [
            EntityKind::Kart,
            EntityKind::Track,
            EntityKind::Projectile,
            EntityKind::Item,
        ];

        for &index in &[0u64, 1, 7, 1337, INDEX_MASK] {
            for &kind in &kinds {
                let id = pack_entity(index, kind);
                assert_eq!(entity_index(id), index);
                assert_eq!(entity_kind(id), Some(kind));
                assert_eq!(validate_entity_id(id), Ok(()));
            }
        }
    }

    #[test]
    fn unknown_kind_and_reserved_bits_are_rejected() {
        let unknown: EntityId = 9 | (200u64 << 48);
        assert_eq!(entity_kind(unknown), None);
        assert_eq!(
            validate_entity_id(unknown),
            Err("EntityId has unknown kind tag")
        );

        let reserved = pack_entity(3, EntityKind::Kart) | (1u64 << 60);
        assert_eq!(
            validate_entity_id(reserved),
            Err("EntityId reserved bits are non-zero")
        );
    }

    #[test]
    fn allocator_counts_per_kind() {
        let mut alloc = EntityAllocator::default();
        let k0 = alloc.allocate(EntityKind::Kart);
        let w0 = alloc.allocate(EntityKind::Track);
        let k1 = alloc.allocate(EntityKind::Kart);

        assert_eq!(entity_index(k0), 0);
        assert_eq!(entity_index(k1), 1);
        assert_eq!(entity_index(w0), 0);
        assert_ne!(k0, w0);
    }
}
