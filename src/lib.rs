//! Persistent hash sets and maps based on CHAMP, with transient batches and
//! insertion order.
//!
//! CHAMP (Compressed Hash-Array Mapped Prefix-tree) is a refined HAMT that
//! guarantees **canonical form**: the same set of entries always produces
//! the same trie structure, regardless of insertion order.
//!
//! # Key properties
//!
//! - **Canonical form**: same contents = same structure, so equality is a
//!   structural walk that skips shared sub-tries
//! - **Structural sharing**: O(1) clone, copy-on-write per node
//! - **Transient batches**: nodes created by the current batch are edited in
//!   place instead of copied, until the collection is frozen or cloned
//! - **Insertion order**: [`SequencedChampSet`] and [`SequencedChampMap`]
//!   tag every entry with a sequence number and iterate in that order
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! The single-threaded collections share nodes through `Rc`; the `*Sync`
//! aliases use `Arc` and are `Send + Sync` for `Send + Sync` contents.
//!
//! # References
//!
//! - Steindorfer & Vinju, 2015: "Optimizing Hash-Array Mapped Tries
//!   for Fast and Lean Immutable JVM Collections", OOPSLA 2015
//! - Bagwell, 2001: "Ideal Hash Trees"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

use archery::ArcK;

pub mod change;
pub mod dump;
pub mod hash;
pub mod iter;
pub mod mutator;
pub mod node;
pub mod ops;
pub mod sequenced;

mod map;
mod seq_map;
mod seq_set;
mod set;
mod trie;

#[cfg(test)]
mod tests;

pub use map::{ChampMap, Keys, MapIter, Values};
pub use seq_map::{SequencedChampMap, SequencedMapIter};
pub use seq_set::{SequencedChampSet, SequencedSetIter};
pub use set::ChampSet;

/// Thread-safe [`ChampMap`], sharing nodes through `Arc`.
///
/// Created with [`Default::default`] or [`FromIterator`]; `new` is only
/// defined for the `Rc` collections.
pub type ChampMapSync<K, V> = ChampMap<K, V, ArcK>;

/// Thread-safe [`ChampSet`], sharing nodes through `Arc`. Created with
/// [`Default::default`].
pub type ChampSetSync<K> = ChampSet<K, ArcK>;

/// Thread-safe [`SequencedChampMap`], sharing nodes through `Arc`. Created with
/// [`Default::default`].
pub type SequencedChampMapSync<K, V> = SequencedChampMap<K, V, ArcK>;

/// Thread-safe [`SequencedChampSet`], sharing nodes through `Arc`. Created with
/// [`Default::default`].
pub type SequencedChampSetSync<K> = SequencedChampSet<K, ArcK>;
