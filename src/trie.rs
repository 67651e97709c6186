//! Collection core shared by the façades: root handle, size, modification
//! counter and the live batch.

use archery::{SharedPointer, SharedPointerKind};

use crate::change::ChangeEvent;
use crate::iter::{Iter, SequencedIter, Strategy};
use crate::mutator::Mutator;
use crate::node::{Node, NodeRef};
use crate::ops::{self, Merge};
use crate::sequenced::{self, SequenceBounds, Sequenced};

/// Root of a trie plus the bookkeeping of one collection.
///
/// `mutator` is `None` while frozen. The first mutating call opens a batch;
/// nodes created during the batch are edited in place until [`freeze`]
/// (or a clone) publishes them.
///
/// [`freeze`]: Self::freeze
pub struct Trie<A, P: SharedPointerKind> {
    root: NodeRef<A, P>,
    size: usize,
    mod_count: u64,
    mutator: Option<Mutator>,
}

impl<A, P: SharedPointerKind> Trie<A, P> {
    pub fn new() -> Self {
        Self {
            root: SharedPointer::new(Node::empty()),
            size: 0,
            mod_count: 0,
            mutator: None,
        }
    }

    pub const fn root(&self) -> &NodeRef<A, P> {
        &self.root
    }

    pub const fn len(&self) -> usize {
        self.size
    }

    pub const fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub const fn is_frozen(&self) -> bool {
        self.mutator.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn batch_allocations(&self) -> usize {
        self.mutator.as_ref().map_or(0, Mutator::allocations)
    }

    pub fn freeze(&mut self) {
        if let Some(mutator) = self.mutator.take() {
            log::trace!(
                "froze mutation batch {:?} after {} allocations",
                mutator.id(),
                mutator.allocations()
            );
        }
    }

    pub fn clear(&mut self) {
        if self.size > 0 {
            self.root = SharedPointer::new(Node::empty());
            self.size = 0;
            self.mod_count += 1;
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        SharedPointer::ptr_eq(&self.root, &other.root)
    }

    pub fn iter(&self) -> Iter<'_, A, P> {
        Iter::new(&self.root, self.size)
    }

    pub fn find<Q, E>(&self, key: &Q, hash: u32, eq: E) -> Option<&A>
    where
        Q: ?Sized,
        E: Fn(&A, &Q) -> bool,
    {
        ops::find(&self.root, key, hash, eq)
    }

    const fn account(&mut self, event: &ChangeEvent<A>) {
        if event.is_added() {
            self.size += 1;
        } else if event.is_removed() {
            self.size -= 1;
        }
        if event.is_modified() {
            self.mod_count += 1;
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Trie<A, P> {
    pub fn update<U, E, H>(
        &mut self,
        payload: A,
        hash: u32,
        update_fn: U,
        eq: E,
        hash_fn: H,
    ) -> ChangeEvent<A>
    where
        U: FnOnce(&A, A) -> Merge<A>,
        E: Fn(&A, &A) -> bool,
        H: Fn(&A) -> u32,
    {
        let mutator = self.mutator.get_or_insert_with(Mutator::new);
        let event = ops::update(
            &mut self.root,
            payload,
            hash,
            update_fn,
            eq,
            hash_fn,
            mutator,
        );
        self.account(&event);
        event
    }

    pub fn remove<Q, E>(&mut self, key: &Q, hash: u32, eq: E) -> ChangeEvent<A>
    where
        Q: ?Sized,
        E: Fn(&A, &Q) -> bool,
    {
        let mutator = self.mutator.get_or_insert_with(Mutator::new);
        let event = ops::remove(&mut self.root, key, hash, eq, mutator);
        self.account(&event);
        event
    }
}

impl<A: PartialEq, P: SharedPointerKind> Trie<A, P> {
    pub fn equivalent(&self, other: &Self) -> bool {
        self.size == other.size && (self.ptr_eq(other) || self.root.equivalent(&other.root))
    }
}

// A clone is frozen. The source keeps its batch, but every node it shares
// with the clone now has a second handle, so the source copies before
// editing.
impl<A, P: SharedPointerKind> Clone for Trie<A, P> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            size: self.size,
            mod_count: self.mod_count,
            mutator: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sequenced core
// ---------------------------------------------------------------------------

/// End of the sequence a payload is pushed to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum End {
    Front,
    Back,
}

/// [`Trie`] of sequence-numbered payloads plus their [`SequenceBounds`].
pub struct SequencedTrie<A, P: SharedPointerKind> {
    trie: Trie<A, P>,
    bounds: SequenceBounds,
}

impl<A, P: SharedPointerKind> SequencedTrie<A, P> {
    pub fn new() -> Self {
        Self {
            trie: Trie::new(),
            bounds: SequenceBounds::EMPTY,
        }
    }

    pub const fn trie(&self) -> &Trie<A, P> {
        &self.trie
    }

    pub const fn trie_mut(&mut self) -> &mut Trie<A, P> {
        &mut self.trie
    }

    pub const fn bounds(&self) -> SequenceBounds {
        self.bounds
    }

    #[cfg(test)]
    pub const fn force_bounds(&mut self, bounds: SequenceBounds) {
        self.bounds = bounds;
    }

    pub fn clear(&mut self) {
        self.trie.clear();
        self.bounds = SequenceBounds::EMPTY;
    }
}

impl<A: Sequenced, P: SharedPointerKind> SequencedTrie<A, P> {
    pub fn iter(&self, strategy: Strategy, reversed: bool) -> SequencedIter<&A> {
        SequencedIter::with_strategy(
            self.trie.root(),
            self.trie.len(),
            self.bounds.first(),
            self.bounds.last(),
            reversed,
            strategy,
        )
    }
}

impl<A: Sequenced + Clone, P: SharedPointerKind> SequencedTrie<A, P> {
    /// Rewrites every sequence number to its rank in sequence order.
    pub fn renumber<H, E>(&mut self, hash_fn: H, eq: E)
    where
        H: Fn(&A) -> u32,
        E: Fn(&A, &A) -> bool,
    {
        let size = self.trie.len();
        let mutator = self.trie.mutator.get_or_insert_with(Mutator::new);
        self.trie.root = sequenced::renumber(&self.trie.root, size, mutator, hash_fn, eq);
        self.trie.mod_count += 1;
        self.bounds = SequenceBounds::dense(size);
    }

    fn reserve<H, E>(&mut self, hash_fn: &H, eq: &E)
    where
        H: Fn(&A) -> u32,
        E: Fn(&A, &A) -> bool,
    {
        if self.bounds.must_renumber() {
            self.renumber(hash_fn, eq);
        }
    }

    /// Inserts `payload` at the back, or resolves it against the stored
    /// payload with the same key without moving it.
    ///
    /// `same` decides whether the stored payload already equals the
    /// candidate, in which case nothing changes.
    pub fn insert<H, E, S>(
        &mut self,
        payload: A,
        hash: u32,
        hash_fn: H,
        eq: E,
        same: S,
    ) -> ChangeEvent<A>
    where
        H: Fn(&A) -> u32,
        E: Fn(&A, &A) -> bool,
        S: Fn(&A, &A) -> bool,
    {
        self.reserve(&hash_fn, &eq);
        let candidate = payload.with_sequence_number(self.bounds.last());
        let event = self.trie.update(
            candidate,
            hash,
            |stored, c| {
                if same(stored, &c) {
                    Merge::Keep(c)
                } else {
                    Merge::Replace(c.with_sequence_number(stored.sequence_number()))
                }
            },
            &eq,
            &hash_fn,
        );
        if event.is_added() {
            self.bounds.next_back();
        }
        event
    }

    /// Inserts `payload` at `end`, moving the stored payload with the same
    /// key there if it sits anywhere else.
    pub fn push<H, E, S>(
        &mut self,
        payload: A,
        hash: u32,
        end: End,
        hash_fn: H,
        eq: E,
        same: S,
    ) -> ChangeEvent<A>
    where
        H: Fn(&A) -> u32,
        E: Fn(&A, &A) -> bool,
        S: Fn(&A, &A) -> bool,
    {
        self.reserve(&hash_fn, &eq);
        let (seq, at_end) = match end {
            End::Back => (self.bounds.last(), self.bounds.last() - 1),
            End::Front => (self.bounds.first(), self.bounds.first() + 1),
        };
        let mut moved = None;
        let event = self.trie.update(
            payload.with_sequence_number(seq),
            hash,
            |stored, c| {
                let old = stored.sequence_number();
                if old != at_end {
                    moved = Some(old);
                    Merge::Replace(c)
                } else if same(stored, &c) {
                    Merge::Keep(c)
                } else {
                    Merge::Replace(c.with_sequence_number(old))
                }
            },
            &eq,
            &hash_fn,
        );
        if event.is_added() || moved.is_some() {
            match end {
                End::Back => self.bounds.next_back(),
                End::Front => self.bounds.next_front(),
            };
        }
        if let Some(old) = moved {
            self.bounds.vacate(old);
        }
        event
    }

    pub fn remove<Q, E>(&mut self, key: &Q, hash: u32, eq: E) -> ChangeEvent<A>
    where
        Q: ?Sized,
        E: Fn(&A, &Q) -> bool,
    {
        let event = self.trie.remove(key, hash, eq);
        if let Some(old) = event.displaced() {
            self.bounds.vacate(old.sequence_number());
        }
        if self.trie.len() == 0 {
            self.bounds = SequenceBounds::EMPTY;
        }
        event
    }
}

impl<A, P: SharedPointerKind> Clone for SequencedTrie<A, P> {
    fn clone(&self) -> Self {
        Self {
            trie: self.trie.clone(),
            bounds: self.bounds,
        }
    }
}
