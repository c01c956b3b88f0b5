//! Error types for table operations that report more than a sentinel.

use core::fmt;

use thiserror::Error;

use crate::hash_table::Bucket;

/// Why an insertion was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertErrorKind {
    /// The key has zero length.
    #[error("key is empty")]
    InvalidKey,

    /// The table has no bucket storage bound, or the storage has zero length.
    #[error("table has no bucket storage")]
    Unbound,

    /// The probe walk visited every slot without finding a usable one. The
    /// table must be rehashed into larger storage before retrying.
    #[error("no free slot among {capacity} buckets")]
    NoSpace {
        /// Number of buckets that were probed.
        capacity: usize,
    },
}

/// A rejected insertion, handing the key and value back to the caller.
pub struct InsertError<K, V> {
    key: K,
    value: V,
    kind: InsertErrorKind,
}

impl<K, V> InsertError<K, V> {
    pub(crate) fn new(key: K, value: V, kind: InsertErrorKind) -> Self {
        Self { key, value, kind }
    }

    /// The reason the insertion was rejected.
    pub fn kind(&self) -> InsertErrorKind {
        self.kind
    }

    /// Returns the rejected key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> fmt::Debug for InsertError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<K, V> fmt::Display for InsertError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert failed: {}", self.kind)
    }
}

impl<K, V> core::error::Error for InsertError<K, V> {}

/// Why a rehash was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashErrorKind {
    /// Rehash only grows; the new storage must be strictly larger.
    #[error("new capacity {requested} is not larger than current capacity {current}")]
    CapacityNotLarger {
        /// Capacity of the storage currently bound.
        current: usize,
        /// Length of the storage offered to the rehash.
        requested: usize,
    },

    /// A live entry could not be placed in the new storage. Every entry
    /// already migrated was moved back before this was returned.
    #[error("rehash into {capacity} buckets saturated after migrating {migrated} entries")]
    Saturated {
        /// Length of the rejected storage.
        capacity: usize,
        /// Entries that had been migrated before the failure.
        migrated: usize,
    },
}

/// A rejected [`HashTable::rehash`](crate::HashTable::rehash), handing the
/// offered storage back to the caller.
///
/// The table is left exactly as usable as before the call. After
/// [`CapacityNotLarger`](RehashErrorKind::CapacityNotLarger) the storage is
/// untouched; after [`Saturated`](RehashErrorKind::Saturated) every bucket in
/// it is [`Bucket::Empty`].
pub struct RehashError<'b, K, V> {
    buckets: &'b mut [Bucket<K, V>],
    kind: RehashErrorKind,
}

impl<'b, K, V> RehashError<'b, K, V> {
    pub(crate) fn new(buckets: &'b mut [Bucket<K, V>], kind: RehashErrorKind) -> Self {
        Self { buckets, kind }
    }

    /// The reason the rehash was rejected.
    pub fn kind(&self) -> RehashErrorKind {
        self.kind
    }

    /// Returns the storage that was offered to the rehash.
    pub fn into_storage(self) -> &'b mut [Bucket<K, V>] {
        self.buckets
    }
}

impl<K, V> fmt::Debug for RehashError<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RehashError")
            .field("kind", &self.kind)
            .field("capacity", &self.buckets.len())
            .finish()
    }
}

impl<K, V> fmt::Display for RehashError<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rehash failed: {}", self.kind)
    }
}

impl<K, V> core::error::Error for RehashError<'_, K, V> {}
