//! Slot hashing for byte-string keys.
//!
//! The table accepts any [`BuildHasher`]; the default is [`Djb2`], a
//! multiply-by-33 rolling hash whose 32-bit wraparound matches the slot layout
//! of existing tables. Key bytes are fed to the hasher through
//! [`Hasher::write`] directly, so no length prefix is mixed in and embedded
//! zero bytes hash like any other byte.

use core::hash::BuildHasher;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "wide-hash")] {
        type Accumulator = u64;
    } else {
        type Accumulator = u32;
    }
}

const DJB2_SEED: Accumulator = 5381;

/// [`BuildHasher`] for the DJB2 string hash.
///
/// # Examples
///
/// ```rust
/// use core::hash::BuildHasher;
/// use core::hash::Hasher;
///
/// use oa_hash::hash::Djb2;
///
/// let mut hasher = Djb2.build_hasher();
/// hasher.write(b"a");
/// assert_eq!(hasher.finish(), 5381 * 33 + 97);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Djb2;

impl BuildHasher for Djb2 {
    type Hasher = Djb2Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}

/// Streaming DJB2 state produced by [`Djb2`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Djb2Hasher {
    acc: Accumulator,
}

impl Default for Djb2Hasher {
    #[inline]
    fn default() -> Self {
        Self { acc: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            // acc * 33 + b, wrapping at the accumulator width
            self.acc = (self.acc << 5)
                .wrapping_add(self.acc)
                .wrapping_add(Accumulator::from(b));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        u64::from(self.acc)
    }
}

/// `foldhash`'s fixed-seed builder, usable as an alternative slot hasher.
///
/// Slot layouts produced with it are not compatible with [`Djb2`] tables.
#[cfg(feature = "foldhash")]
pub type FoldHashBuilder = foldhash::fast::FixedState;

/// Computes the home slot of `key` in a table of `capacity` buckets.
///
/// Returns `None` for an empty key or a zero capacity; no probing may happen
/// in either case.
#[inline]
pub fn slot_for<S: BuildHasher>(hash_builder: &S, key: &[u8], capacity: usize) -> Option<usize> {
    if key.is_empty() || capacity == 0 {
        return None;
    }

    let mut hasher = hash_builder.build_hasher();
    hasher.write(key);
    Some((hasher.finish() % capacity as u64) as usize)
}
