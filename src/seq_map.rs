//! Insertion-ordered CHAMP map.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::Map;
use std::ops;

use archery::{RcK, SharedPointerKind};

use crate::hash::hash_one;
use crate::iter::{self, SequencedIter, Strategy};
use crate::node::NodeRef;
use crate::sequenced::{SequenceBounds, SequencedEntry};
use crate::trie::{End, SequencedTrie};

/// Iterator over the `(&K, &V)` pairs of a [`SequencedChampMap`], in
/// sequence order.
pub type SequencedMapIter<'a, K, V> =
    Map<SequencedIter<&'a SequencedEntry<K, V>>, fn(&'a SequencedEntry<K, V>) -> (&'a K, &'a V)>;

/// Persistent hash map that remembers insertion order.
///
/// [`insert`](Self::insert) leaves an existing key where it is;
/// [`push_back`](Self::push_back) and [`push_front`](Self::push_front) move
/// it to the respective end.
pub struct SequencedChampMap<K, V, P: SharedPointerKind = RcK> {
    inner: SequencedTrie<SequencedEntry<K, V>, P>,
}

fn entry_hash<K: Hash, V>(e: &SequencedEntry<K, V>) -> u32 {
    hash_one(e.key())
}

fn same_key<K: Eq, V>(a: &SequencedEntry<K, V>, b: &SequencedEntry<K, V>) -> bool {
    a.key() == b.key()
}

fn same_value<K, V: PartialEq>(a: &SequencedEntry<K, V>, b: &SequencedEntry<K, V>) -> bool {
    a.value() == b.value()
}

const fn pair<K, V>(e: &SequencedEntry<K, V>) -> (&K, &V) {
    (e.key(), e.value())
}

impl<K, V> SequencedChampMap<K, V> {
    /// Creates an empty map with the default [`RcK`] pointer kind.
    ///
    /// Maps over another pointer kind are created with
    /// [`Default::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, P: SharedPointerKind> SequencedChampMap<K, V, P> {
    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.trie().len()
    }

    /// Returns `true` if the map contains no entries.
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

    /// Removes every entry and resets the sequence counter.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns `true` if both maps share the same root node.
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
    pub const fn root(&self) -> &NodeRef<SequencedEntry<K, V>, P> {
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

    /// Returns an iterator over `(&K, &V)` pairs in insertion order.
    pub fn iter(&self) -> SequencedMapIter<'_, K, V> {
        self.inner
            .iter(Strategy::Auto, false)
            .map(pair as fn(&SequencedEntry<K, V>) -> (&K, &V))
    }

    /// Returns an iterator over `(&K, &V)` pairs in reverse insertion order.
    pub fn iter_rev(&self) -> SequencedMapIter<'_, K, V> {
        self.inner
            .iter(Strategy::Auto, true)
            .map(pair as fn(&SequencedEntry<K, V>) -> (&K, &V))
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Returns a sequence-ordered iterator over the sequenced entries, with
    /// an explicit strategy.
    #[must_use]
    pub fn iter_with(
        &self,
        strategy: Strategy,
        reversed: bool,
    ) -> SequencedIter<&SequencedEntry<K, V>> {
        self.inner.iter(strategy, reversed)
    }

    /// Returns an iterator over the sequenced entries in trie order.
    #[must_use]
    pub fn hash_iter(&self) -> iter::Iter<'_, SequencedEntry<K, V>, P> {
        self.inner.trie().iter()
    }

    /// Returns the oldest entry. O(n).
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Returns the newest entry. O(n).
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.iter_rev().next()
    }
}

impl<K: Hash + Eq, V, P: SharedPointerKind> SequencedChampMap<K, V, P> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .trie()
            .find(key, hash_one(key), |e: &SequencedEntry<K, V>, q: &Q| {
                e.key().borrow() == q
            })
            .map(pair)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V, P> SequencedChampMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    P: SharedPointerKind,
{
    /// Inserts a key-value pair. A new key goes to the back; an existing
    /// key keeps its position and takes the new value.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` otherwise.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_one(&key);
        self.inner
            .insert(
                SequencedEntry::unassigned(key, value),
                hash,
                entry_hash,
                same_key,
                same_value,
            )
            .into_displaced()
            .map(|e| e.into_pair().1)
    }

    /// Inserts a key-value pair at the back, moving an existing key there.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` otherwise.
    pub fn push_back(&mut self, key: K, value: V) -> Option<V> {
        self.push(key, value, End::Back)
    }

    /// Inserts a key-value pair at the front, moving an existing key there.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` otherwise.
    pub fn push_front(&mut self, key: K, value: V) -> Option<V> {
        self.push(key, value, End::Front)
    }

    fn push(&mut self, key: K, value: V, end: End) -> Option<V> {
        let hash = hash_one(&key);
        self.inner
            .push(
                SequencedEntry::unassigned(key, value),
                hash,
                end,
                entry_hash,
                same_key,
                same_value,
            )
            .into_displaced()
            .map(|e| e.into_pair().1)
    }

    /// Removes a key. Returns the removed value, or `None` if the key was
    /// not present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .remove(key, hash_one(key), |e: &SequencedEntry<K, V>, q: &Q| {
                e.key().borrow() == q
            })
            .into_displaced()
            .map(SequencedEntry::into_pair)
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let key = self.first()?.0.clone();
        self.remove_entry(&key)
    }

    /// Removes and returns the newest entry.
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let key = self.last()?.0.clone();
        self.remove_entry(&key)
    }

    /// Rewrites the sequence numbers to `0..len`, keeping the order.
    pub fn renumber(&mut self) {
        self.inner.renumber(entry_hash, same_key);
    }

    /// Returns a new version with `key` bound to `value`; `self` is left
    /// unchanged.
    #[must_use]
    pub fn inserted(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next.freeze();
        next
    }

    /// Returns a new version without `key`; `self` is left unchanged.
    #[must_use]
    pub fn removed<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut next = self.clone();
        next.remove(key);
        next.freeze();
        next
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let snapshot = self.clone();
        let mut entries = iter::Removable::new(snapshot.iter(), |(key, _): (&K, &V)| {
            self.remove(key);
        });
        while let Some((key, value)) = entries.next() {
            if !keep(key, value) {
                entries.remove();
            }
        }
    }
}

impl<K: PartialEq, V: PartialEq, P: SharedPointerKind> SequencedChampMap<K, V, P> {
    /// Returns `true` if both maps hold the same entries, in any order.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.inner.trie().equivalent(other.inner.trie())
    }
}

impl<K, V, P: SharedPointerKind> Clone for SequencedChampMap<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, P: SharedPointerKind> Default for SequencedChampMap<K, V, P> {
    fn default() -> Self {
        Self {
            inner: SequencedTrie::new(),
        }
    }
}

impl<K: PartialEq, V: PartialEq, P: SharedPointerKind> PartialEq for SequencedChampMap<K, V, P> {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl<K: Eq, V: Eq, P: SharedPointerKind> Eq for SequencedChampMap<K, V, P> {}

impl<K, V, P: SharedPointerKind> fmt::Debug for SequencedChampMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencedChampMap")
            .field("len", &self.len())
            .field("bounds", &self.sequence_bounds())
            .field("mod_count", &self.mod_count())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

impl<K, V, P> Extend<(K, V)> for SequencedChampMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    P: SharedPointerKind,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, P> FromIterator<(K, V)> for SequencedChampMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    P: SharedPointerKind,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map.freeze();
        map
    }
}

impl<K, V, Q, P> ops::Index<&Q> for SequencedChampMap<K, V, P>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    P: SharedPointerKind,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V, P: SharedPointerKind> IntoIterator for &'a SequencedChampMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = SequencedMapIter<'a, K, V>;

    fn into_iter(self) -> SequencedMapIter<'a, K, V> {
        self.iter()
    }
}
