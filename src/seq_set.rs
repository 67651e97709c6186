//! Insertion-ordered CHAMP set.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::Map;

use archery::{RcK, SharedPointerKind};

use crate::hash::hash_one;
use crate::iter::{self, SequencedIter, Strategy};
use crate::node::NodeRef;
use crate::sequenced::{SequenceBounds, SequencedElement};
use crate::trie::{End, SequencedTrie};

/// Iterator over the elements of a [`SequencedChampSet`], in sequence order.
pub type SequencedSetIter<'a, K> =
    Map<SequencedIter<&'a SequencedElement<K>>, fn(&'a SequencedElement<K>) -> &'a K>;

/// Persistent hash set that remembers insertion order.
///
/// Elements are stored in a CHAMP trie keyed by hash, each tagged with a
/// sequence number. [`iter`](Self::iter) yields them in sequence order,
/// [`hash_iter`](Self::hash_iter) in trie order. Sequence numbers are
/// renumbered to `0..len` before the counter can overflow.
pub struct SequencedChampSet<K, P: SharedPointerKind = RcK> {
    inner: SequencedTrie<SequencedElement<K>, P>,
}

fn element_hash<K: Hash>(e: &SequencedElement<K>) -> u32 {
    hash_one(e.element())
}

fn same_element<K: Eq>(a: &SequencedElement<K>, b: &SequencedElement<K>) -> bool {
    a.element() == b.element()
}

const fn element<K>(e: &SequencedElement<K>) -> &K {
    e.element()
}

impl<K> SequencedChampSet<K> {
    /// Creates an empty set with the default [`RcK`] pointer kind.
    ///
    /// Sets over another pointer kind, such as
    /// [`SequencedChampSetSync`](crate::SequencedChampSetSync), are created
    /// with [`Default::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, P: SharedPointerKind> SequencedChampSet<K, P> {
    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.trie().len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of structural modifications so far.
    #[must_use]
    pub const fn mod_count(&self) -> u64 {
        self.inner.trie().mod_count()
    }

    /// Returns `true` if no batch is open.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.inner.trie().is_frozen()
    }

    /// Closes the current batch.
    pub fn freeze(&mut self) {
        self.inner.trie_mut().freeze();
    }

    /// Removes every element and resets the sequence counter.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns `true` if both sets share the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.trie().ptr_eq(other.inner.trie())
    }

    /// Number of trie nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.trie().node_count()
    }

    /// Number of nodes allocated by the current batch, 0 when frozen.
    #[must_use]
    pub fn batch_allocations(&self) -> usize {
        self.inner.trie().batch_allocations()
    }

    /// Root node.
    #[must_use]
    pub const fn root(&self) -> &NodeRef<SequencedElement<K>, P> {
        self.inner.trie().root()
    }

    /// Exclusive bounds of the sequence numbers in use.
    #[must_use]
    pub const fn sequence_bounds(&self) -> SequenceBounds {
        self.inner.bounds()
    }

    #[cfg(test)]
    pub(crate) const fn force_bounds(&mut self, bounds: SequenceBounds) {
        self.inner.force_bounds(bounds);
    }

    /// Returns an iterator over the elements in insertion order.
    pub fn iter(&self) -> SequencedSetIter<'_, K> {
        self.inner
            .iter(Strategy::Auto, false)
            .map(element as fn(&SequencedElement<K>) -> &K)
    }

    /// Returns an iterator over the elements in reverse insertion order.
    pub fn iter_rev(&self) -> SequencedSetIter<'_, K> {
        self.inner
            .iter(Strategy::Auto, true)
            .map(element as fn(&SequencedElement<K>) -> &K)
    }

    /// Returns a sequence-ordered iterator over the sequenced elements,
    /// with an explicit strategy.
    #[must_use]
    pub fn iter_with(
        &self,
        strategy: Strategy,
        reversed: bool,
    ) -> SequencedIter<&SequencedElement<K>> {
        self.inner.iter(strategy, reversed)
    }

    /// Returns an iterator over the sequenced elements in trie order.
    #[must_use]
    pub fn hash_iter(&self) -> iter::Iter<'_, SequencedElement<K>, P> {
        self.inner.trie().iter()
    }

    /// Returns the oldest element. O(n).
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.iter().next()
    }

    /// Returns the newest element. O(n).
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.iter_rev().next()
    }
}

impl<K: Hash + Eq, P: SharedPointerKind> SequencedChampSet<K, P> {
    /// Returns `true` if the set contains `value`.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(value).is_some()
    }

    /// Returns the stored element equal to `value`.
    #[must_use]
    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .trie()
            .find(value, hash_one(value), |e: &SequencedElement<K>, q: &Q| {
                e.element().borrow() == q
            })
            .map(SequencedElement::element)
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> SequencedChampSet<K, P> {
    /// Adds `value` at the back. An element already present keeps its
    /// position. Returns `true` if `value` was not present.
    pub fn insert(&mut self, value: K) -> bool {
        let hash = hash_one(&value);
        self.inner
            .insert(
                SequencedElement::unassigned(value),
                hash,
                element_hash,
                same_element,
                |_, _| true,
            )
            .is_added()
    }

    /// Adds `value` at the back, moving it there if already present.
    /// Returns `true` if `value` was not present.
    pub fn push_back(&mut self, value: K) -> bool {
        self.push(value, End::Back)
    }

    /// Adds `value` at the front, moving it there if already present.
    /// Returns `true` if `value` was not present.
    pub fn push_front(&mut self, value: K) -> bool {
        self.push(value, End::Front)
    }

    fn push(&mut self, value: K, end: End) -> bool {
        let hash = hash_one(&value);
        self.inner
            .push(
                SequencedElement::unassigned(value),
                hash,
                end,
                element_hash,
                same_element,
                |_, _| true,
            )
            .is_added()
    }

    /// Removes `value`. Returns `true` if it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .remove(value, hash_one(value), |e: &SequencedElement<K>, q: &Q| {
                e.element().borrow() == q
            })
            .into_displaced()
            .map(SequencedElement::into_element)
    }

    /// Removes and returns the oldest element.
    pub fn pop_front(&mut self) -> Option<K> {
        let first = self.first()?.clone();
        self.take(&first)
    }

    /// Removes and returns the newest element.
    pub fn pop_back(&mut self) -> Option<K> {
        let last = self.last()?.clone();
        self.take(&last)
    }

    /// Rewrites the sequence numbers to `0..len`, keeping the order.
    pub fn renumber(&mut self) {
        self.inner.renumber(element_hash, same_element);
    }

    /// Returns a new version with `value` added at the back; `self` is left
    /// unchanged.
    #[must_use]
    pub fn inserted(&self, value: K) -> Self {
        let mut next = self.clone();
        next.insert(value);
        next.freeze();
        next
    }

    /// Returns a new version without `value`; `self` is left unchanged.
    #[must_use]
    pub fn removed<Q>(&self, value: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut next = self.clone();
        next.remove(value);
        next.freeze();
        next
    }

    /// Keeps only the elements for which `keep` returns `true`.
    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut keep: F) {
        let snapshot = self.clone();
        let mut elements = iter::Removable::new(snapshot.iter(), |value: &K| {
            self.remove(value);
        });
        while let Some(value) = elements.next() {
            if !keep(value) {
                elements.remove();
            }
        }
    }
}

impl<K: PartialEq, P: SharedPointerKind> SequencedChampSet<K, P> {
    /// Returns `true` if both sets hold the same elements, in any order.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.inner.trie().equivalent(other.inner.trie())
    }
}

impl<K, P: SharedPointerKind> Clone for SequencedChampSet<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, P: SharedPointerKind> Default for SequencedChampSet<K, P> {
    fn default() -> Self {
        Self {
            inner: SequencedTrie::new(),
        }
    }
}

impl<K: PartialEq, P: SharedPointerKind> PartialEq for SequencedChampSet<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl<K: Eq, P: SharedPointerKind> Eq for SequencedChampSet<K, P> {}

impl<K, P: SharedPointerKind> fmt::Debug for SequencedChampSet<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencedChampSet")
            .field("len", &self.len())
            .field("bounds", &self.sequence_bounds())
            .field("mod_count", &self.mod_count())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> Extend<K> for SequencedChampSet<K, P> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> FromIterator<K> for SequencedChampSet<K, P> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set.freeze();
        set
    }
}

impl<'a, K, P: SharedPointerKind> IntoIterator for &'a SequencedChampSet<K, P> {
    type Item = &'a K;
    type IntoIter = SequencedSetIter<'a, K>;

    fn into_iter(self) -> SequencedSetIter<'a, K> {
        self.iter()
    }
}
