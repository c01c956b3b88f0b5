//! The probing table engine.
//!
//! [`HashTable`] resolves byte-string keys to slots of a caller-supplied
//! bucket array with linear probing. Removal leaves a tombstone
//! ([`Bucket::Deleted`]) so that probe chains running through the vacated
//! slot stay intact; tombstones are reused by later insertions and dropped by
//! [`HashTable::rehash`].

use core::fmt;
use core::fmt::Debug;
use core::hash::BuildHasher;

use crate::error::InsertError;
use crate::error::InsertErrorKind;
use crate::error::RehashError;
use crate::error::RehashErrorKind;
use crate::hash;
use crate::hash::Djb2;

/// What an insertion does when its probe walk visits every slot without
/// reaching an empty one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Reject the key, even if a tombstone was passed on the way. A table in
    /// this state has to be rehashed before it accepts new keys.
    #[default]
    Strict,
    /// Fall back to the first tombstone passed on the way, if there was one.
    ReclaimTombstones,
}

/// One slot of the bucket array.
///
/// Bucket arrays are owned by the caller; a table only borrows them. Build
/// them from [`Bucket::EMPTY`] or [`Default`]:
///
/// ```rust
/// use oa_hash::Bucket;
///
/// let buckets: [Bucket<&[u8], u32>; 16] = [Bucket::EMPTY; 16];
/// assert!(buckets.iter().all(Bucket::is_empty));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Bucket<K, V> {
    /// Never used since the storage was bound. Terminates every probe walk.
    #[default]
    Empty,
    /// Holds a live key and its value.
    Occupied {
        /// The key, compared byte for byte.
        key: K,
        /// The caller's value.
        value: V,
    },
    /// Tombstone left by a removal. Probe walks continue past it.
    Deleted,
}

impl<K, V> Bucket<K, V> {
    /// An empty bucket, usable in array repeat expressions.
    pub const EMPTY: Self = Bucket::Empty;

    /// Returns `true` for a slot that has never held a key.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Bucket::Empty)
    }

    /// Returns `true` for a slot holding a live key.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(self, Bucket::Occupied { .. })
    }

    /// Returns `true` for a tombstone.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        matches!(self, Bucket::Deleted)
    }

    /// The live key, if any.
    #[inline]
    pub fn key(&self) -> Option<&K> {
        match self {
            Bucket::Occupied { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The live value, if any.
    #[inline]
    pub fn value(&self) -> Option<&V> {
        match self {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    fn occupy(&mut self, key: K, value: V) -> (&K, &mut V) {
        *self = Bucket::Occupied { key, value };
        match self {
            Bucket::Occupied { key, value } => (&*key, value),
            _ => unreachable!("bucket was just occupied"),
        }
    }
}

impl<K: Debug, V: Debug> Debug for Bucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Empty => f.write_str("Empty"),
            Bucket::Deleted => f.write_str("Deleted"),
            Bucket::Occupied { key, value } => f
                .debug_struct("Occupied")
                .field("key", key)
                .field("value", value)
                .finish(),
        }
    }
}

fn reset<K, V>(buckets: &mut [Bucket<K, V>]) {
    for bucket in buckets.iter_mut() {
        *bucket = Bucket::Empty;
    }
}

/// Outcome of a linear probe walk.
enum Probe {
    /// An occupied slot holding the key.
    Hit(usize),
    /// The walk reached an empty slot. `vacant` is where the key would go: the
    /// first tombstone passed, or the empty slot itself.
    Miss { vacant: usize },
    /// Every slot was visited without a hit or an empty slot.
    Exhausted { first_deleted: Option<usize> },
}

/// Walks at most `buckets.len()` slots from `home`, wrapping at the end.
///
/// `home` must be below `buckets.len()`.
fn probe<K: AsRef<[u8]>, V>(buckets: &[Bucket<K, V>], home: usize, key: &[u8]) -> Probe {
    let capacity = buckets.len();
    let mut first_deleted = None;

    for step in 0..capacity {
        let index = (home + step) % capacity;
        match &buckets[index] {
            Bucket::Empty => {
                return Probe::Miss {
                    vacant: first_deleted.unwrap_or(index),
                };
            }
            Bucket::Deleted => {
                first_deleted.get_or_insert(index);
            }
            Bucket::Occupied { key: stored, .. } if stored.as_ref() == key => {
                return Probe::Hit(index);
            }
            Bucket::Occupied { .. } => {}
        }
    }

    Probe::Exhausted { first_deleted }
}

/// Picks the slot an insertion of `key` writes to: the matching occupied slot
/// for an update, or a vacant one.
fn insert_slot<K, V, S>(
    hash_builder: &S,
    buckets: &[Bucket<K, V>],
    key: &[u8],
    policy: InsertPolicy,
) -> Result<usize, InsertErrorKind>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    if key.is_empty() {
        return Err(InsertErrorKind::InvalidKey);
    }

    let capacity = buckets.len();
    let home = hash::slot_for(hash_builder, key, capacity).ok_or(InsertErrorKind::Unbound)?;

    match probe(buckets, home, key) {
        Probe::Hit(index) | Probe::Miss { vacant: index } => Ok(index),
        Probe::Exhausted { first_deleted } => match (policy, first_deleted) {
            (InsertPolicy::ReclaimTombstones, Some(index)) => Ok(index),
            _ => {
                log::debug!(
                    "no free slot for {}-byte key among {capacity} buckets",
                    key.len()
                );
                Err(InsertErrorKind::NoSpace { capacity })
            }
        },
    }
}

/// An open-addressing hash table over caller-supplied bucket storage.
///
/// The table never allocates: storage is handed in when the table is built
/// and again on every [`rehash`](Self::rehash), and it is handed back by
/// [`cleanup`](Self::cleanup) and `rehash`. Keys are any `K: AsRef<[u8]>`
/// and are compared byte for byte, so they may contain zero bytes. With
/// `K = &[u8]` the table stores only borrowed views and the borrow checker
/// keeps the key bytes alive for as long as the table uses them.
///
/// The table never grows on its own. When an insertion reports no space,
/// rehash into larger storage and retry.
///
/// ## Example
///
/// ```rust
/// use oa_hash::Bucket;
/// use oa_hash::HashTable;
///
/// let mut buckets = [Bucket::EMPTY; 64];
/// let mut table = HashTable::new(&mut buckets);
///
/// let entry = table.set_entry(&b"key"[..], 42).unwrap();
/// assert_eq!(*entry.get(), 42);
///
/// assert_eq!(table.get(b"key"), Some(&42));
/// assert!(table.remove(b"key"));
/// assert_eq!(table.get(b"key"), None);
/// ```
pub struct HashTable<'b, K, V, S = Djb2> {
    buckets: Option<&'b mut [Bucket<K, V>]>,
    len: usize,
    policy: InsertPolicy,
    hash_builder: S,
}

impl<K, V, S> Debug for HashTable<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("HashTable");
        match self.buckets.as_deref() {
            Some(buckets) => s.field("slots", &SlotMap(buckets)),
            None => s.field("slots", &"unbound"),
        };
        s.field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Renders slots 16 to a row: `..` empty, `xx` tombstone, `##` occupied.
struct SlotMap<'a, K, V>(&'a [Bucket<K, V>]);

impl<K, V> Debug for SlotMap<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.chunks(16).map(SlotRow))
            .finish()
    }
}

struct SlotRow<'a, K, V>(&'a [Bucket<K, V>]);

impl<K, V> Debug for SlotRow<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bucket) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(match bucket {
                Bucket::Empty => "..",
                Bucket::Deleted => "xx",
                Bucket::Occupied { .. } => "##",
            })?;
        }
        Ok(())
    }
}

impl<K, V, S: Default> Default for HashTable<'_, K, V, S> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<'b, K, V> HashTable<'b, K, V, Djb2> {
    /// Binds a table to `buckets`, hashing keys with [`Djb2`].
    ///
    /// Every bucket is reset to [`Bucket::Empty`], so storage handed back by
    /// an earlier table can be reused directly.
    pub fn new(buckets: &'b mut [Bucket<K, V>]) -> Self {
        Self::with_hasher_and_policy(buckets, Djb2, InsertPolicy::Strict)
    }

    /// Binds a table to `buckets` with an explicit [`InsertPolicy`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    /// use oa_hash::InsertPolicy;
    ///
    /// let mut buckets = [Bucket::EMPTY; 2];
    /// let mut table = HashTable::with_policy(&mut buckets, InsertPolicy::ReclaimTombstones);
    /// table.set(&b"a"[..], 1).unwrap();
    /// table.set(&b"b"[..], 2).unwrap();
    /// table.remove(b"a");
    ///
    /// // No empty slot is left, but the tombstone can be reclaimed.
    /// assert!(table.set(&b"c"[..], 3).is_some());
    /// ```
    pub fn with_policy(buckets: &'b mut [Bucket<K, V>], policy: InsertPolicy) -> Self {
        Self::with_hasher_and_policy(buckets, Djb2, policy)
    }
}

impl<'b, K, V, S> HashTable<'b, K, V, S> {
    /// Binds a table to `buckets`, hashing keys with `hash_builder`.
    pub fn with_hasher(buckets: &'b mut [Bucket<K, V>], hash_builder: S) -> Self {
        Self::with_hasher_and_policy(buckets, hash_builder, InsertPolicy::Strict)
    }

    /// Binds a table to `buckets` with both a hasher and an insert policy.
    pub fn with_hasher_and_policy(
        buckets: &'b mut [Bucket<K, V>],
        hash_builder: S,
        policy: InsertPolicy,
    ) -> Self {
        reset(buckets);
        Self {
            buckets: Some(buckets),
            len: 0,
            policy,
            hash_builder,
        }
    }

    /// Creates a table with no storage. Every lookup misses and every
    /// insertion fails until storage is supplied through
    /// [`rehash`](HashTable::rehash).
    pub fn unbound() -> Self
    where
        S: Default,
    {
        Self {
            buckets: None,
            len: 0,
            policy: InsertPolicy::default(),
            hash_builder: S::default(),
        }
    }

    /// Detaches the storage and resets the table to zero length and zero
    /// capacity.
    ///
    /// The storage is returned untouched; the table never frees it. Calling
    /// this on a table that is already detached does nothing and returns
    /// `None`.
    pub fn cleanup(&mut self) -> Option<&'b mut [Bucket<K, V>]> {
        self.len = 0;
        let buckets = self.buckets.take();
        if let Some(buckets) = &buckets {
            log::debug!("detached {} buckets", buckets.len());
        }
        buckets
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no live entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the bound storage, or zero when unbound.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.as_deref().map_or(0, <[_]>::len)
    }

    /// Number of tombstones currently in the storage.
    pub fn tombstones(&self) -> usize {
        self.buckets().iter().filter(|b| b.is_deleted()).count()
    }

    /// The policy applied when a probe walk finds no empty slot.
    #[inline]
    pub fn policy(&self) -> InsertPolicy {
        self.policy
    }

    /// The hasher used to pick home slots.
    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Read-only view of the bound storage; empty when unbound.
    #[inline]
    pub fn buckets(&self) -> &[Bucket<K, V>] {
        self.buckets.as_deref().unwrap_or(&[])
    }

    fn entry_at(&mut self, index: usize) -> Option<OccupiedEntry<'_, K, V>> {
        match self.buckets.as_deref_mut()?.get_mut(index)? {
            Bucket::Occupied { key, value } => Some(OccupiedEntry { index, key, value }),
            _ => None,
        }
    }
}

impl<'b, K, V, S> HashTable<'b, K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    /// Slot holding `key`, if present. An empty key or an unbound table is an
    /// immediate miss.
    fn find_index(&self, key: &[u8]) -> Option<usize> {
        let buckets = self.buckets.as_deref()?;
        let home = hash::slot_for(&self.hash_builder, key, buckets.len())?;
        match probe(buckets, home, key) {
            Probe::Hit(index) => Some(index),
            Probe::Miss { .. } | Probe::Exhausted { .. } => None,
        }
    }

    /// Looks up `key` and returns a handle to its slot.
    ///
    /// The handle can read and replace the value but never the key or the
    /// slot state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    ///
    /// let mut buckets = [Bucket::EMPTY; 8];
    /// let mut table = HashTable::new(&mut buckets);
    /// table.set(&b"hits"[..], 1).unwrap();
    ///
    /// if let Some(mut entry) = table.get_entry(b"hits") {
    ///     *entry.get_mut() += 1;
    /// }
    /// assert_eq!(table.get(b"hits"), Some(&2));
    /// assert!(table.get_entry(b"misses").is_none());
    /// ```
    pub fn get_entry(&mut self, key: &[u8]) -> Option<OccupiedEntry<'_, K, V>> {
        let index = self.find_index(key)?;
        self.entry_at(index)
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let index = self.find_index(key)?;
        self.buckets.as_deref()?.get(index)?.value()
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let index = self.find_index(key)?;
        self.buckets.as_deref_mut()?.get_mut(index)?.value_mut()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find_index(key).is_some()
    }

    pub(crate) fn insert(
        &mut self,
        key: K,
        value: V,
        policy: InsertPolicy,
    ) -> Result<OccupiedEntry<'_, K, V>, InsertError<K, V>> {
        if key.as_ref().is_empty() {
            return Err(InsertError::new(key, value, InsertErrorKind::InvalidKey));
        }
        let Some(buckets) = self.buckets.as_deref_mut() else {
            return Err(InsertError::new(key, value, InsertErrorKind::Unbound));
        };

        let index = match insert_slot(&self.hash_builder, buckets, key.as_ref(), policy) {
            Ok(index) => index,
            Err(kind) => return Err(InsertError::new(key, value, kind)),
        };

        let (key, value) = match &mut buckets[index] {
            Bucket::Occupied {
                key: stored,
                value: current,
            } => {
                *current = value;
                (&*stored, current)
            }
            vacant => {
                self.len += 1;
                vacant.occupy(key, value)
            }
        };

        Ok(OccupiedEntry { index, key, value })
    }

    /// Inserts `key` or updates its value, returning a handle to the slot.
    ///
    /// Updating keeps the key stored by the first insertion and does not
    /// change [`len`](Self::len). Returns `None` for an empty key, for an
    /// unbound table, and when no slot is free; in the last case the table
    /// must be rehashed into larger storage before retrying.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    ///
    /// let mut buckets = [Bucket::EMPTY; 1];
    /// let mut table = HashTable::new(&mut buckets);
    ///
    /// assert!(table.set_entry(&b"first"[..], 1).is_some());
    /// assert!(table.set_entry(&b"first"[..], 2).is_some());
    /// assert_eq!(table.len(), 1);
    ///
    /// // Full: rehash before inserting another key.
    /// assert!(table.set_entry(&b"second"[..], 3).is_none());
    /// ```
    pub fn set_entry(&mut self, key: K, value: V) -> Option<OccupiedEntry<'_, K, V>> {
        let policy = self.policy;
        self.insert(key, value, policy).ok()
    }

    /// Inserts or updates `key`, returning a reference to the stored value.
    pub fn set(&mut self, key: K, value: V) -> Option<&mut V> {
        self.set_entry(key, value).map(OccupiedEntry::into_mut)
    }

    /// Like [`set`](Self::set), but a rejected key and value are handed back
    /// together with the reason.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    /// use oa_hash::InsertErrorKind;
    ///
    /// let mut buckets = [Bucket::EMPTY; 4];
    /// let mut table = HashTable::new(&mut buckets);
    ///
    /// let err = table.try_set(&b""[..], 7).unwrap_err();
    /// assert_eq!(err.kind(), InsertErrorKind::InvalidKey);
    /// assert_eq!(err.into_parts().1, 7);
    /// ```
    pub fn try_set(&mut self, key: K, value: V) -> Result<&mut V, InsertError<K, V>> {
        let policy = self.policy;
        self.insert(key, value, policy).map(OccupiedEntry::into_mut)
    }

    /// Removes `key`, returning its value.
    ///
    /// The slot becomes a tombstone: lookups keep probing past it, and a later
    /// insertion on the same probe chain may reuse it.
    pub fn take(&mut self, key: &[u8]) -> Option<V> {
        let index = self.find_index(key)?;
        let bucket = self.buckets.as_deref_mut()?.get_mut(index)?;
        match core::mem::replace(bucket, Bucket::Deleted) {
            Bucket::Occupied { value, .. } => {
                self.len -= 1;
                Some(value)
            }
            other => {
                *bucket = other;
                None
            }
        }
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.take(key).is_some()
    }

    /// Migrates every live entry into `new_buckets`, which must be strictly
    /// longer than the current storage.
    ///
    /// Tombstones are not carried over. On success the old storage is handed
    /// back to the caller; the table never frees it. On failure the table is
    /// left bound to its old storage with every entry still reachable, and
    /// the rejected storage is handed back inside the [`RehashError`].
    ///
    /// An unbound table accepts any non-empty storage and hands back an empty
    /// slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    ///
    /// let mut small = [Bucket::EMPTY; 2];
    /// let mut large = [Bucket::EMPTY; 8];
    ///
    /// let mut table = HashTable::new(&mut small);
    /// table.set(&b"a"[..], 1).unwrap();
    /// table.set(&b"b"[..], 2).unwrap();
    /// assert!(table.set(&b"c"[..], 3).is_none());
    ///
    /// let old = table.rehash(&mut large).unwrap();
    /// assert_eq!(old.len(), 2);
    /// assert!(table.set(&b"c"[..], 3).is_some());
    /// assert_eq!(table.get(b"a"), Some(&1));
    /// ```
    pub fn rehash(
        &mut self,
        new_buckets: &'b mut [Bucket<K, V>],
    ) -> Result<&'b mut [Bucket<K, V>], RehashError<'b, K, V>> {
        let policy = self.policy;
        self.rehash_with(new_buckets, |table, key, value| {
            table.insert(key, value, policy).map(drop)
        })
    }

    fn rehash_with<F>(
        &mut self,
        new_buckets: &'b mut [Bucket<K, V>],
        mut place: F,
    ) -> Result<&'b mut [Bucket<K, V>], RehashError<'b, K, V>>
    where
        F: FnMut(&mut Self, K, V) -> Result<(), InsertError<K, V>>,
    {
        let current = self.capacity();
        let requested = new_buckets.len();
        if requested <= current {
            return Err(RehashError::new(
                new_buckets,
                RehashErrorKind::CapacityNotLarger { current, requested },
            ));
        }

        reset(new_buckets);
        let len_before = self.len;
        let Some(old) = self.buckets.replace(new_buckets) else {
            log::debug!("bound {requested} buckets to an unbound table");
            return Ok(Default::default());
        };
        self.len = 0;

        log::trace!("rehashing {len_before} entries from {current} into {requested} buckets");

        for index in 0..old.len() {
            if !old[index].is_occupied() {
                continue;
            }
            let Bucket::Occupied { key, value } = core::mem::replace(&mut old[index], Bucket::Deleted)
            else {
                continue;
            };

            if let Err(err) = place(self, key, value) {
                let (key, value) = err.into_parts();
                old[index] = Bucket::Occupied { key, value };

                let migrated = self.len;
                let rejected = self.roll_back(old, len_before - migrated);
                log::warn!(
                    "rehash into {requested} buckets failed after {migrated} of {len_before} \
                     entries, rolled back"
                );
                return Err(RehashError::new(
                    rejected,
                    RehashErrorKind::Saturated {
                        capacity: requested,
                        migrated,
                    },
                ));
            }
        }

        debug_assert_eq!(self.len, len_before);
        log::debug!("rehashed {} entries into {requested} buckets", self.len);
        Ok(old)
    }

    /// Rebinds `old` and moves every entry in the current storage back into
    /// it. Slots vacated by the migration stay tombstones until refilled, so no
    /// probe chain in `old` reaches an empty slot early and there is one
    /// tombstone for every entry moved back.
    ///
    /// Returns the storage that was unbound, emptied.
    fn roll_back(
        &mut self,
        old: &'b mut [Bucket<K, V>],
        unmigrated: usize,
    ) -> &'b mut [Bucket<K, V>] {
        let Some(new_buckets) = self.buckets.replace(old) else {
            return Default::default();
        };
        self.len = unmigrated;

        for bucket in new_buckets.iter_mut() {
            if !bucket.is_occupied() {
                continue;
            }
            let Bucket::Occupied { key, value } = core::mem::replace(bucket, Bucket::Empty) else {
                continue;
            };
            if let Err(err) = self.insert(key, value, InsertPolicy::ReclaimTombstones) {
                log::error!("entry lost while rolling back rehash: {err}");
            }
        }
        new_buckets
    }
}

#[cfg(feature = "alloc")]
impl<V, S> HashTable<'_, alloc::boxed::Box<[u8]>, V, S>
where
    S: BuildHasher,
{
    /// Copying variant of [`set_entry`](Self::set_entry): the key bytes are
    /// copied into an owned buffer, so the caller's buffer may be dropped
    /// right after the call.
    ///
    /// Updating an existing key does not allocate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oa_hash::Bucket;
    /// use oa_hash::HashTable;
    ///
    /// let mut buckets: Vec<Bucket<Box<[u8]>, u32>> = (0..16).map(|_| Bucket::EMPTY).collect();
    /// let mut table = HashTable::new(&mut buckets);
    /// {
    ///     let scratch = String::from("transient");
    ///     table.set_entry_copied(scratch.as_bytes(), 9).unwrap();
    /// }
    /// assert_eq!(table.get(b"transient"), Some(&9));
    /// ```
    pub fn set_entry_copied(
        &mut self,
        key: &[u8],
        value: V,
    ) -> Option<OccupiedEntry<'_, alloc::boxed::Box<[u8]>, V>> {
        if key.is_empty() {
            return None;
        }
        if let Some(index) = self.find_index(key) {
            let mut entry = self.entry_at(index)?;
            *entry.get_mut() = value;
            return Some(entry);
        }
        self.set_entry(alloc::boxed::Box::from(key), value)
    }

    /// Copying variant of [`set`](Self::set).
    pub fn set_copied(&mut self, key: &[u8], value: V) -> Option<&mut V> {
        self.set_entry_copied(key, value)
            .map(OccupiedEntry::into_mut)
    }
}

/// Probe-length distribution of a table.
///
/// Bin `n` counts the live entries stored `n` slots past their home slot.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: alloc::vec::Vec<usize>,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// Entry counts by probe distance.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (distance, &count) in self.bins.iter().enumerate() {
            println!("{distance:>3} | {} ({count})", make_bar(count));
        }
    }
}

/// Slot utilization statistics of a table.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Length of the bound storage
    pub capacity: usize,
    /// Number of tombstones
    pub tombstones: usize,
    /// Number of never-used slots
    pub empty_slots: usize,
    /// populated / capacity
    pub load_factor: f64,
    /// Longest distance from an entry's home slot to where it is stored
    pub max_probe_length: usize,
    /// Mean distance from home slot over all live entries
    pub mean_probe_length: f64,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} empty, {} tombstones",
            self.empty_slots, self.tombstones
        );
        println!(
            "Probe length: max {}, mean {:.2}",
            self.max_probe_length, self.mean_probe_length
        );
    }
}

#[cfg(feature = "stats")]
impl<K, V, S> HashTable<'_, K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    fn probe_distances(&self) -> impl Iterator<Item = usize> + '_ {
        let buckets = self.buckets();
        let capacity = buckets.len();
        buckets.iter().enumerate().filter_map(move |(index, bucket)| {
            let key = bucket.key()?;
            let home = hash::slot_for(&self.hash_builder, key.as_ref(), capacity)?;
            Some((index + capacity - home) % capacity)
        })
    }

    /// Computes the probe-length histogram of the live entries.
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = alloc::vec::Vec::new();
        for distance in self.probe_distances() {
            if bins.len() <= distance {
                bins.resize(distance + 1, 0);
            }
            bins[distance] += 1;
        }
        ProbeHistogram { bins }
    }

    /// Returns slot utilization and probe-length statistics.
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.capacity();
        let (max_probe_length, total_distance) = self
            .probe_distances()
            .fold((0, 0), |(max, sum), d| (max.max(d), sum + d));

        DebugStats {
            populated: self.len,
            capacity,
            tombstones: self.tombstones(),
            empty_slots: self.buckets().iter().filter(|b| b.is_empty()).count(),
            load_factor: if capacity == 0 {
                0.0
            } else {
                self.len as f64 / capacity as f64
            },
            max_probe_length,
            mean_probe_length: if self.len == 0 {
                0.0
            } else {
                total_distance as f64 / self.len as f64
            },
        }
    }
}

/// A handle to an occupied slot, returned by lookups and insertions.
///
/// It exposes the stored key read-only and the value read-write.
pub struct OccupiedEntry<'a, K, V> {
    index: usize,
    key: &'a K,
    value: &'a mut V,
}

impl<K: Debug, V: Debug> Debug for OccupiedEntry<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("index", &self.index)
            .field("key", self.key)
            .field("value", &*self.value)
            .finish()
    }
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Position of the slot in the bucket array.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The key stored in the slot.
    #[inline]
    pub fn key(&self) -> &K {
        self.key
    }

    /// Gets a reference to the value.
    #[inline]
    pub fn get(&self) -> &V {
        &*self.value
    }

    /// Gets a mutable reference to the value.
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        &mut *self.value
    }

    /// Converts the handle into a mutable reference bound to the table
    /// borrow.
    #[inline]
    pub fn into_mut(self) -> &'a mut V {
        self.value
    }

    /// Replaces the value, returning the old one.
    #[inline]
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.value, value)
    }
}
