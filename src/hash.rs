//! Key hashing for the 32-bit trie.
//!
//! The trie consumes a 32-bit hash in 5-bit partitions. Keys are hashed with
//! the deterministic standard hasher and the 64-bit result is folded so that
//! both halves contribute to every partition.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Computes the 32-bit trie hash of a value using the standard hasher.
#[must_use]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u32 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    fold(hasher.finish())
}

/// Folds a 64-bit hash into 32 bits (`high ⊕ low`).
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}
