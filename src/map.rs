//! Hash-ordered CHAMP map.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::Map;
use std::ops;

use archery::{RcK, SharedPointerKind};

use crate::hash::hash_one;
use crate::iter;
use crate::node::NodeRef;
use crate::ops::Merge;
use crate::trie::Trie;

/// Iterator over the `(&K, &V)` pairs of a [`ChampMap`], in hash order.
pub type MapIter<'a, K, V, P> = Map<iter::Iter<'a, (K, V), P>, fn(&'a (K, V)) -> (&'a K, &'a V)>;

/// Iterator over the keys of a [`ChampMap`].
pub type Keys<'a, K, V, P> = Map<iter::Iter<'a, (K, V), P>, fn(&'a (K, V)) -> &'a K>;

/// Iterator over the values of a [`ChampMap`].
pub type Values<'a, K, V, P> = Map<iter::Iter<'a, (K, V), P>, fn(&'a (K, V)) -> &'a V>;

/// Persistent hash map based on a CHAMP trie.
///
/// Cloning is O(1) and shares the whole trie; each copy then copies the
/// nodes it edits. A run of edits on one copy forms a batch: nodes created
/// during the batch are edited in place until [`freeze`](Self::freeze) or
/// the next clone.
///
/// The same set of entries always produces the same trie structure
/// (canonical form), so [`equivalent`](Self::equivalent) is a structural
/// comparison.
pub struct ChampMap<K, V, P: SharedPointerKind = RcK> {
    trie: Trie<(K, V), P>,
}

fn entry_hash<K: Hash, V>(entry: &(K, V)) -> u32 {
    hash_one(&entry.0)
}

fn same_key<K: Eq, V>(a: &(K, V), b: &(K, V)) -> bool {
    a.0 == b.0
}

// ---------------------------------------------------------------------------
// Construction & accessors: no trait bounds
// ---------------------------------------------------------------------------

impl<K, V> ChampMap<K, V> {
    /// Creates an empty map with the default [`RcK`] pointer kind.
    ///
    /// Maps over another pointer kind, such as [`ChampMapSync`], are created
    /// with [`Default::default`].
    ///
    /// [`ChampMapSync`]: crate::ChampMapSync
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the map contains no entries.
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

    /// Closes the current batch. Later edits copy every node they touch
    /// once more.
    pub fn freeze(&mut self) {
        self.trie.freeze();
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.trie.clear();
    }

    /// Returns `true` if both maps share the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(other.trie())
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

    /// Root node, for inspection and [`dump::to_dot`](crate::dump::to_dot).
    #[must_use]
    pub const fn root(&self) -> &NodeRef<(K, V), P> {
        self.trie.root()
    }

    pub(crate) const fn trie(&self) -> &Trie<(K, V), P> {
        &self.trie
    }

    /// Returns an iterator over `(&K, &V)` pairs, in hash order.
    pub fn iter(&self) -> MapIter<'_, K, V, P> {
        const fn pair<K, V>(entry: &(K, V)) -> (&K, &V) {
            (&entry.0, &entry.1)
        }
        self.trie.iter().map(pair as fn(&(K, V)) -> (&K, &V))
    }

    /// Returns an iterator over the keys, in hash order.
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        const fn key<K, V>(entry: &(K, V)) -> &K {
            &entry.0
        }
        self.trie.iter().map(key as fn(&(K, V)) -> &K)
    }

    /// Returns an iterator over the values, in hash order.
    pub fn values(&self) -> Values<'_, K, V, P> {
        const fn value<K, V>(entry: &(K, V)) -> &V {
            &entry.1
        }
        self.trie.iter().map(value as fn(&(K, V)) -> &V)
    }
}

// ---------------------------------------------------------------------------
// Read operations: K: Hash + Eq
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V, P: SharedPointerKind> ChampMap<K, V, P> {
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
        self.trie
            .find(key, hash_one(key), |entry: &(K, V), q: &Q| {
                entry.0.borrow() == q
            })
            .map(|entry| (&entry.0, &entry.1))
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

// ---------------------------------------------------------------------------
// Write operations: K: Hash + Eq + Clone, V: Clone + PartialEq
// ---------------------------------------------------------------------------

impl<K, V, P> ChampMap<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
    P: SharedPointerKind,
{
    /// Inserts a key-value pair into the map.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` otherwise.
    /// Inserting a value equal to the stored one changes nothing: the root
    /// stays pointer-identical and `mod_count` does not move.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_one(&key);
        self.trie
            .update(
                (key, value),
                hash,
                |stored, candidate| {
                    if stored.1 == candidate.1 {
                        Merge::Keep(candidate)
                    } else {
                        Merge::Replace(candidate)
                    }
                },
                same_key,
                entry_hash,
            )
            .into_displaced()
            .map(|(_, v)| v)
    }

    /// Removes a key from the map. Returns the removed value, or `None` if
    /// the key was not present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.trie
            .remove(key, hash_one(key), |entry: &(K, V), q: &Q| {
                entry.0.borrow() == q
            })
            .into_displaced()
            .map(|(_, v)| v)
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
    ///
    /// Walks a snapshot and removes the rejected keys from `self`.
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

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K: PartialEq, V: PartialEq, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Returns `true` if both maps hold the same entries.
    ///
    /// Compares the tries structurally; shared sub-tries are skipped by
    /// pointer identity.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.trie.equivalent(other.trie())
    }
}

impl<K, V, P: SharedPointerKind> Clone for ChampMap<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            trie: self.trie.clone(),
        }
    }
}

impl<K, V, P: SharedPointerKind> Default for ChampMap<K, V, P> {
    fn default() -> Self {
        Self { trie: Trie::new() }
    }
}

impl<K: PartialEq, V: PartialEq, P: SharedPointerKind> PartialEq for ChampMap<K, V, P> {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl<K: Eq, V: Eq, P: SharedPointerKind> Eq for ChampMap<K, V, P> {}

impl<K, V, P: SharedPointerKind> fmt::Debug for ChampMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChampMap")
            .field("len", &self.len())
            .field("mod_count", &self.mod_count())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

impl<K, V, P> Extend<(K, V)> for ChampMap<K, V, P>
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

impl<K, V, P> FromIterator<(K, V)> for ChampMap<K, V, P>
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

impl<K, V, Q, P> ops::Index<&Q> for ChampMap<K, V, P>
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

impl<'a, K, V, P: SharedPointerKind> IntoIterator for &'a ChampMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = MapIter<'a, K, V, P>;

    fn into_iter(self) -> MapIter<'a, K, V, P> {
        self.iter()
    }
}
