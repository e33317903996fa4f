//! Fixed-width unsigned integer keys.
//!
//! A key of `W` bytes is consumed one byte per level. The root sits at level
//! `W` and branches on the most significant byte; the node at level 1 holds
//! values and is indexed by the least significant byte.

use std::fmt::Debug;

/// Unsigned integer usable as a [`RadixTree`](crate::RadixTree) key.
///
/// Implemented for `u8`, `u16`, `u32`, `u64`, `u128` and `usize`.
pub trait RadixKey: Copy + Eq + Debug {
    /// Key width in bytes; also the number of node levels in the tree.
    const BYTES: usize;

    /// The all-zero key, used as the initial "previous key" of a fresh tree.
    const ZERO: Self;

    /// Byte consumed by the node at `level` (1-based).
    ///
    /// `level` 1 yields the least significant byte, `level` `BYTES` the most
    /// significant one.
    fn byte_at(self, level: usize) -> u8;

    /// Highest level whose byte differs between `self` and `other`, or 0 when
    /// the keys are equal.
    ///
    /// Every level above the returned one resolves to the same node for both
    /// keys.
    fn divergence(self, other: Self) -> usize;
}

macro_rules! impl_radix_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl RadixKey for $t {
                const BYTES: usize = std::mem::size_of::<$t>();
                const ZERO: Self = 0;

                #[inline(always)]
                fn byte_at(self, level: usize) -> u8 {
                    debug_assert!((1..=Self::BYTES).contains(&level), "level out of bounds");
                    (self >> ((level - 1) * 8)) as u8
                }

                #[inline(always)]
                fn divergence(self, other: Self) -> usize {
                    let diff = self ^ other;
                    Self::BYTES - (diff.leading_zeros() as usize / 8)
                }
            }
        )*
    };
}

impl_radix_key!(u8, u16, u32, u64, u128, usize);
