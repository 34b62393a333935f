use num_traits::{One, PrimInt};

/// Trait implemented by enums that can be stored as bits of a [`BitmaskFlags`].
///
/// The enum's discriminant (via `#[repr(u8)]`) typically determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // Equivalent to: 1 << index
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A compact set of flag values, e.g. the edge kinds a traversal may follow.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    /// Build a set from a list of tags.
    pub fn of<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let bits = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        Self { bits }
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    #[repr(u8)]
    enum Tag {
        A,
        B,
        C,
    }

    impl FlagBitmask for Tag {
        type Storage = u8;

        fn bit_index(&self) -> u8 {
            *self as u8
        }
    }

    #[test]
    fn of_sets_one_bit_per_tag() {
        let flags = BitmaskFlags::of(&[Tag::A, Tag::C]);
        assert_eq!(flags.bits, 0b101);
        assert!(flags.has(Tag::A));
        assert!(!flags.has(Tag::B));
        assert!(flags.has(Tag::C));
    }

    #[test]
    fn default_is_empty() {
        let flags = BitmaskFlags::<u8>::default();
        assert_eq!(flags, BitmaskFlags::of::<Tag>(&[]));
        assert!(!flags.has(Tag::A));
    }
}
