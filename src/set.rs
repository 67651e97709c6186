//! Hash-ordered CHAMP set.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use archery::{RcK, SharedPointerKind};

use crate::hash::hash_one;
use crate::iter::{self, Iter};
use crate::node::NodeRef;
use crate::ops::Merge;
use crate::trie::Trie;

/// Persistent hash set based on a CHAMP trie.
///
/// Shares the batch and cloning behaviour of [`ChampMap`](crate::ChampMap).
pub struct ChampSet<K, P: SharedPointerKind = RcK> {
    trie: Trie<K, P>,
}

fn same<K: Eq>(a: &K, b: &K) -> bool {
    a == b
}

impl<K> ChampSet<K> {
    /// Creates an empty set with the default [`RcK`] pointer kind.
    ///
    /// Sets over another pointer kind are created with
    /// [`Default::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, P: SharedPointerKind> ChampSet<K, P> {
    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.len() == 0
    }

    /// Number of structural modifications so far.
    #[must_use]
    pub const fn mod_count(&self) -> u64 {
        self.trie.mod_count()
    }

    /// Returns `true` if no batch is open.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.trie.is_frozen()
    }

    /// Closes the current batch.
    pub fn freeze(&mut self) {
        self.trie.freeze();
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.trie.clear();
    }

    /// Returns `true` if both sets share the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(&other.trie)
    }

    /// Number of trie nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.trie.node_count()
    }

    /// Number of nodes allocated by the current batch, 0 when frozen.
    #[must_use]
    pub fn batch_allocations(&self) -> usize {
        self.trie.batch_allocations()
    }

    /// Root node.
    #[must_use]
    pub const fn root(&self) -> &NodeRef<K, P> {
        self.trie.root()
    }

    /// Returns an iterator over the elements, in hash order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, P> {
        self.trie.iter()
    }
}

impl<K: Hash + Eq, P: SharedPointerKind> ChampSet<K, P> {
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
        self.trie
            .find(value, hash_one(value), |k: &K, q: &Q| k.borrow() == q)
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> ChampSet<K, P> {
    /// Adds `value`. Returns `true` if it was not present; an equal
    /// element already stored is kept.
    pub fn insert(&mut self, value: K) -> bool {
        let hash = hash_one(&value);
        self.trie
            .update(
                value,
                hash,
                |_, candidate| Merge::Keep(candidate),
                same,
                hash_one::<K>,
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
        self.trie
            .remove(value, hash_one(value), |k: &K, q: &Q| k.borrow() == q)
            .into_displaced()
    }

    /// Returns a new version containing `value`; `self` is left unchanged.
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

impl<K: PartialEq, P: SharedPointerKind> ChampSet<K, P> {
    /// Returns `true` if both sets hold the same elements.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.trie.equivalent(&other.trie)
    }
}

impl<K, P: SharedPointerKind> Clone for ChampSet<K, P> {
    fn clone(&self) -> Self {
        Self {
            trie: self.trie.clone(),
        }
    }
}

impl<K, P: SharedPointerKind> Default for ChampSet<K, P> {
    fn default() -> Self {
        Self { trie: Trie::new() }
    }
}

impl<K: PartialEq, P: SharedPointerKind> PartialEq for ChampSet<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl<K: Eq, P: SharedPointerKind> Eq for ChampSet<K, P> {}

impl<K, P: SharedPointerKind> fmt::Debug for ChampSet<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChampSet")
            .field("len", &self.len())
            .field("mod_count", &self.mod_count())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> Extend<K> for ChampSet<K, P> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<K: Hash + Eq + Clone, P: SharedPointerKind> FromIterator<K> for ChampSet<K, P> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set.freeze();
        set
    }
}

impl<'a, K, P: SharedPointerKind> IntoIterator for &'a ChampSet<K, P> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, P>;

    fn into_iter(self) -> Iter<'a, K, P> {
        self.iter()
    }
}
