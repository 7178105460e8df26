use num_traits::{One, PrimInt};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) is the bit index inside `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Compact set of flags backed by a primitive integer.
///
/// Used for the transform dirty bits and the kart status bits, both of which
/// are read and written every tick and should stay `Copy`.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    /// Build a set with every tag in `tags` raised.
    pub fn from_tags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        flags.add_many(tags);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    /// Raise or clear `tag` depending on `on`.
    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, tag: U, on: bool) {
        if on {
            self.add(tag);
        } else {
            self.remove(tag);
        }
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// ```text
/// define_bitmask_flags!(KartStatus, u8, {
///     Airborne,
///     Sliding,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    (
        $(#[$meta:meta])* $name:ident, $storage:ty,
        { $($(#[$vmeta:meta])* $variant:ident),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}
