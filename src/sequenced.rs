//! Sequence-numbered payloads for insertion-ordered collections.
//!
//! The trie stores payloads in hash order. Sequenced collections wrap every
//! key (or key/value pair) together with an `i32` sequence number recording
//! its relative insertion order; the sequenced iterators in
//! [`iter`](crate::iter) sort by it. Equality and hashing of the wrappers
//! ignore the sequence number, so lookups and deduplication behave as if it
//! did not exist.

use std::fmt;
use std::hash::{Hash, Hasher};

use archery::SharedPointerKind;

use crate::iter::{HeapIter, Iter};
use crate::mutator::Mutator;
use crate::node::{BitmapNode, Node, NodeRef};
use crate::ops::{self, Merge};

/// Sentinel for a sequence number that has not been assigned yet.
pub const NO_SEQUENCE_NUMBER: i32 = i32::MIN;

/// Distance from either end of the `i32` range at which a collection
/// renumbers before assigning another sequence number.
pub const OVERFLOW_MARGIN: i32 = 2;

/// Bucket iteration is chosen while `last - first <= size * BUCKET_DENSITY`.
pub const BUCKET_DENSITY: i64 = 4;

/// A payload carrying a sequence number.
pub trait Sequenced {
    /// Returns the sequence number.
    fn sequence_number(&self) -> i32;

    /// Returns `self` renumbered to `seq`.
    #[must_use]
    fn with_sequence_number(self, seq: i32) -> Self;
}

// ---------------------------------------------------------------------------
// Payload wrappers
// ---------------------------------------------------------------------------

/// Set element with its sequence number.
#[derive(Clone)]
pub struct SequencedElement<K> {
    element: K,
    seq: i32,
}

impl<K> SequencedElement<K> {
    /// Wraps `element` with sequence number `seq`.
    #[must_use]
    pub const fn new(element: K, seq: i32) -> Self {
        Self { element, seq }
    }

    /// Wraps `element` without a sequence number.
    #[must_use]
    pub const fn unassigned(element: K) -> Self {
        Self::new(element, NO_SEQUENCE_NUMBER)
    }

    /// The wrapped element.
    #[must_use]
    pub const fn element(&self) -> &K {
        &self.element
    }

    /// Unwraps the element.
    #[must_use]
    pub fn into_element(self) -> K {
        self.element
    }
}

impl<K> Sequenced for SequencedElement<K> {
    fn sequence_number(&self) -> i32 {
        self.seq
    }

    fn with_sequence_number(self, seq: i32) -> Self {
        Self { seq, ..self }
    }
}

impl<K: PartialEq> PartialEq for SequencedElement<K> {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

impl<K: Eq> Eq for SequencedElement<K> {}

impl<K: Hash> Hash for SequencedElement<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
    }
}

impl<K: fmt::Debug> fmt::Debug for SequencedElement<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.element, self.seq)
    }
}

/// Map entry with its sequence number.
#[derive(Clone)]
pub struct SequencedEntry<K, V> {
    key: K,
    value: V,
    seq: i32,
}

impl<K, V> SequencedEntry<K, V> {
    /// Wraps `key` and `value` with sequence number `seq`.
    #[must_use]
    pub const fn new(key: K, value: V, seq: i32) -> Self {
        Self { key, value, seq }
    }

    /// Wraps `key` and `value` without a sequence number.
    #[must_use]
    pub const fn unassigned(key: K, value: V) -> Self {
        Self::new(key, value, NO_SEQUENCE_NUMBER)
    }

    /// The key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// The value.
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Unwraps into `(key, value)`.
    #[must_use]
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> Sequenced for SequencedEntry<K, V> {
    fn sequence_number(&self) -> i32 {
        self.seq
    }

    fn with_sequence_number(self, seq: i32) -> Self {
        Self { seq, ..self }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for SequencedEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: Eq, V: Eq> Eq for SequencedEntry<K, V> {}

impl<K: Hash, V: Hash> Hash for SequencedEntry<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.value.hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SequencedEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}={:?}#{}", self.key, self.value, self.seq)
    }
}

// ---------------------------------------------------------------------------
// Sequence bounds
// ---------------------------------------------------------------------------

/// Exclusive bounds of the sequence numbers in use.
///
/// Every live sequence number lies strictly between `first` and `last`.
/// New elements go to `last` (then `last` grows) or to `first` (then
/// `first` shrinks).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SequenceBounds {
    first: i32,
    last: i32,
}

impl SequenceBounds {
    /// Bounds of an empty collection.
    pub const EMPTY: Self = Self { first: -1, last: 0 };

    /// Bounds after renumbering `size` elements to `0..size`.
    ///
    /// # Panics
    ///
    /// Panics if `size` does not fit the sequence range.
    #[must_use]
    pub fn dense(size: usize) -> Self {
        let last = i32::try_from(size).expect("collection too large to sequence");
        Self { first: -1, last }
    }

    /// Returns these bounds with the lower bound replaced.
    #[must_use]
    pub const fn with_first(self, first: i32) -> Self {
        Self { first, ..self }
    }

    /// Returns these bounds with the upper bound replaced.
    #[must_use]
    pub const fn with_last(self, last: i32) -> Self {
        Self { last, ..self }
    }

    /// Exclusive lower bound.
    #[must_use]
    pub const fn first(self) -> i32 {
        self.first
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn last(self) -> i32 {
        self.last
    }

    /// Assigns the sequence number after every live one.
    pub const fn next_back(&mut self) -> i32 {
        let seq = self.last;
        self.last += 1;
        seq
    }

    /// Assigns the sequence number before every live one.
    pub const fn next_front(&mut self) -> i32 {
        let seq = self.first;
        self.first -= 1;
        seq
    }

    /// Tightens the bounds after `seq` stopped being used, if it sat at
    /// either end.
    pub const fn vacate(&mut self, seq: i32) {
        if seq == self.first + 1 {
            self.first += 1;
        } else if seq == self.last - 1 {
            self.last -= 1;
        }
    }

    /// Returns `true` once assigning another number risks overflow.
    #[must_use]
    pub const fn must_renumber(self) -> bool {
        must_renumber(self.first, self.last)
    }
}

impl Default for SequenceBounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Returns `true` if the bounds `(first, last)` are within
/// [`OVERFLOW_MARGIN`] of either end of the `i32` range.
#[must_use]
pub const fn must_renumber(first: i32, last: i32) -> bool {
    last > i32::MAX - OVERFLOW_MARGIN || first < i32::MIN + OVERFLOW_MARGIN
}

// ---------------------------------------------------------------------------
// Renumbering
// ---------------------------------------------------------------------------

/// Rebuilds the trie rooted at `root` with dense sequence numbers
/// `0..size`, preserving sequence order.
///
/// Payloads are re-inserted through [`ops::update`] under `mutator`, so the
/// new trie is owned by the batch. `root` itself is not modified.
///
/// # Panics
///
/// Panics if `size` does not fit the sequence range.
pub fn renumber<A, P, H, E>(
    root: &NodeRef<A, P>,
    size: usize,
    mutator: &mut Mutator,
    hash_fn: H,
    eq: E,
) -> NodeRef<A, P>
where
    A: Sequenced + Clone,
    P: SharedPointerKind,
    H: Fn(&A) -> u32,
    E: Fn(&A, &A) -> bool,
{
    let empty = Node::Bitmap(BitmapNode::empty(Some(mutator.id())));
    let mut rebuilt = empty.alloc(mutator);
    let ordered = HeapIter::new(Iter::new(root, size), false);
    for (rank, payload) in ordered.enumerate() {
        let seq = i32::try_from(rank).expect("collection too large to sequence");
        let hash = hash_fn(payload);
        let renumbered = payload.clone().with_sequence_number(seq);
        ops::update(
            &mut rebuilt,
            renumbered,
            hash,
            |_, c| Merge::Replace(c),
            &eq,
            &hash_fn,
            mutator,
        );
    }
    log::debug!("renumbered {size} sequenced payloads");
    rebuilt
}
