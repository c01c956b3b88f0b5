#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

/// Error types returned by the richer insertion and rehash APIs.
pub mod error;

/// Slot hashing: the DJB2 hasher and the key-to-slot mapping.
pub mod hash;

pub mod hash_table;

pub use error::InsertError;
pub use error::InsertErrorKind;
pub use error::RehashError;
pub use error::RehashErrorKind;
pub use hash::Djb2;
pub use hash_table::Bucket;
pub use hash_table::HashTable;
pub use hash_table::InsertPolicy;
pub use hash_table::OccupiedEntry;
