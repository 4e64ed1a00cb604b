use num_traits::{One, PrimInt};

/// Trait implemented by flag enums stored in a [`BitmaskFlags`].
///
/// The enum's discriminant (via `#[repr(u8)]`) is the bit index.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Small bitset over a flag enum.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
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

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    /// Union, used when flags are inherited down the scene graph.
    pub fn union(self, other: Self) -> Self {
        Self::new(self.bits | other.bits)
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// wayfarer_shared::define_bitmask_flags!(NodeBits, u8, {
///     Hidden,
///     Transparent,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($(#[$meta:meta])* $variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$meta])* $variant),*
        }

        impl $crate::flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(NodeFlag, u8, {
    /// Node and its subtree are not rendered; classification skips them.
    Hidden,
    /// Material hint forced by the authoring tool.
    Transparent,
    /// Authoring opt-out from collision.
    NoCollide,
});

pub type NodeFlags = BitmaskFlags<u8>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_and_query() {
        let mut flags = NodeFlags::default();
        assert!(flags.is_empty());

        flags.add(NodeFlag::Hidden);
        assert!(flags.has(NodeFlag::Hidden));
        assert!(!flags.has(NodeFlag::NoCollide));

        flags.remove(NodeFlag::Hidden);
        assert!(flags.is_empty());
    }

    #[test]
    fn union_inherits_parent_bits() {
        let parent = NodeFlags::from_flags(&[NodeFlag::Hidden]);
        let child = NodeFlags::from_flags(&[NodeFlag::Transparent]);
        let merged = parent.union(child);

        assert!(merged.has(NodeFlag::Hidden));
        assert!(merged.has(NodeFlag::Transparent));
        assert!(!merged.has(NodeFlag::NoCollide));
    }
}
