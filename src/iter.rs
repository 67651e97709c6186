//! Iterators over CHAMP tries.
//!
//! [`Iter`] walks a trie depth-first and yields payloads in hash order. The
//! sequenced iterators yield payloads in sequence-number order on top of one
//! depth-first pass:
//!
//! - [`BucketIter`] drops every payload into a span-sized array indexed by
//!   sequence number, O(span) time and space. Used when sequence numbers are
//!   dense: `last - first <= size * BUCKET_DENSITY`.
//! - [`HeapIter`] loads every payload into a priority queue, O(n log n).
//!   Used when sequence numbers are sparse.
//!
//! [`SequencedIter::new`] picks one of the two once, at construction time.
//! [`FailFast`] and [`Removable`] wrap any iterator with a modification
//! guard and a removal hook respectively.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::iter::{FusedIterator, Rev};
use std::ops::Deref;
use std::slice;

use archery::SharedPointerKind;
use smallvec::SmallVec;

use crate::node::{MAX_DEPTH, Node, Slot};
use crate::sequenced::{BUCKET_DENSITY, Sequenced};

// ---------------------------------------------------------------------------
// Depth-first iterator
// ---------------------------------------------------------------------------

enum Frame<'a, A, P: SharedPointerKind> {
    Bitmap {
        data: slice::Iter<'a, Slot<A, P>>,
        children: Rev<slice::Iter<'a, Slot<A, P>>>,
    },
    Collision(slice::Iter<'a, A>),
}

impl<A, P: SharedPointerKind> Clone for Frame<'_, A, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Bitmap { data, children } => Self::Bitmap {
                data: data.clone(),
                children: children.clone(),
            },
            Self::Collision(entries) => Self::Collision(entries.clone()),
        }
    }
}

impl<'a, A, P: SharedPointerKind> Frame<'a, A, P> {
    fn of(node: &'a Node<A, P>) -> Self {
        match node {
            Node::Bitmap(n) => Self::Bitmap {
                data: n.data_slots().iter(),
                children: n.node_slots().iter().rev(),
            },
            Node::Collision(n) => Self::Collision(n.entries().iter()),
        }
    }
}

/// Depth-first iterator over the payloads of a trie, in hash order.
///
/// Visits a node's payloads, then its children in ascending bit order.
pub struct Iter<'a, A, P: SharedPointerKind> {
    stack: SmallVec<[Frame<'a, A, P>; MAX_DEPTH]>,
    remaining: usize,
}

impl<'a, A, P: SharedPointerKind> Iter<'a, A, P> {
    /// Creates an iterator over the trie rooted at `root`, which holds `len`
    /// payloads.
    #[must_use]
    pub fn new(root: &'a Node<A, P>, len: usize) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Frame::of(root));
        Self {
            stack,
            remaining: len,
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Iter<'a, A, P> {
    type Item = &'a A;

    fn next(&mut self) -> Option<&'a A> {
        loop {
            let child = match self.stack.last_mut()? {
                Frame::Bitmap { data, children } => {
                    if let Some(slot) = data.next() {
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some(slot.payload());
                    }
                    children.next().map(Slot::child)
                }
                Frame::Collision(entries) => {
                    if let Some(a) = entries.next() {
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some(a);
                    }
                    None
                }
            };
            match child {
                Some(node) => self.stack.push(Frame::of(node)),
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<A, P: SharedPointerKind> Clone for Iter<'_, A, P> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<A, P: SharedPointerKind> ExactSizeIterator for Iter<'_, A, P> {}

impl<A, P: SharedPointerKind> FusedIterator for Iter<'_, A, P> {}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// Iteration strategy for sequenced iteration.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Strategy {
    /// Bucket when sequence numbers are dense, heap otherwise.
    #[default]
    Auto,
    /// Always use [`BucketIter`].
    Bucket,
    /// Always use [`HeapIter`].
    Heap,
}

/// Returns `true` if `[first, last]` is dense enough for [`BucketIter`].
#[must_use]
pub fn bucket_supported(size: usize, first: i32, last: i32) -> bool {
    let extent = i64::from(last) - i64::from(first);
    let budget = i64::try_from(size)
        .unwrap_or(i64::MAX)
        .saturating_mul(BUCKET_DENSITY);
    extent <= budget
}

// ---------------------------------------------------------------------------
// Bucket iterator
// ---------------------------------------------------------------------------

/// Sequence-ordered iterator backed by an array with one bucket per sequence
/// number in `[first, last]`.
pub struct BucketIter<T> {
    buckets: Vec<Option<T>>,
    pos: usize,
    remaining: usize,
}

impl<T> BucketIter<T>
where
    T: Deref,
    T::Target: Sequenced,
{
    /// Places every item into its bucket.
    ///
    /// Every item's sequence number must lie within `[first, last]`.
    ///
    /// # Panics
    ///
    /// Panics if an item lies outside `[first, last]`.
    pub fn new<I>(items: I, size: usize, first: i32, last: i32, reversed: bool) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let span = usize::try_from(i64::from(last) - i64::from(first) + 1).unwrap_or(0);
        let mut buckets: Vec<Option<T>> = Vec::with_capacity(span);
        buckets.resize_with(span, || None);
        for item in items {
            let seq = i64::from(item.sequence_number());
            let offset = if reversed {
                i64::from(last) - seq
            } else {
                seq - i64::from(first)
            };
            let at = usize::try_from(offset).expect("sequence number outside [first, last]");
            buckets[at] = Some(item);
        }
        Self {
            buckets,
            pos: 0,
            remaining: size,
        }
    }
}

impl<T> Iterator for BucketIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.pos < self.buckets.len() {
            let bucket = self.buckets[self.pos].take();
            self.pos += 1;
            if bucket.is_some() {
                self.remaining = self.remaining.saturating_sub(1);
                return bucket;
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> FusedIterator for BucketIter<T> {}

// ---------------------------------------------------------------------------
// Heap iterator
// ---------------------------------------------------------------------------

struct Ranked<T> {
    rank: i64,
    item: T,
}

// Reversed so that `BinaryHeap` pops the smallest rank first.
impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank.cmp(&self.rank)
    }
}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl<T> Eq for Ranked<T> {}

/// Sequence-ordered iterator backed by a priority queue.
pub struct HeapIter<T> {
    queue: BinaryHeap<Ranked<T>>,
}

impl<T> HeapIter<T>
where
    T: Deref,
    T::Target: Sequenced,
{
    /// Loads every item into the queue, ranked by sequence number (negated
    /// when `reversed`).
    pub fn new<I>(items: I, reversed: bool) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let queue = items
            .into_iter()
            .map(|item| {
                let seq = i64::from(item.sequence_number());
                let rank = if reversed { -seq } else { seq };
                Ranked { rank, item }
            })
            .collect();
        Self { queue }
    }
}

impl<T> Iterator for HeapIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.pop().map(|ranked| ranked.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl<T> ExactSizeIterator for HeapIter<T> {}

impl<T> FusedIterator for HeapIter<T> {}

// ---------------------------------------------------------------------------
// Sequenced iterator
// ---------------------------------------------------------------------------

/// Sequence-ordered iterator over a trie, bucket- or heap-backed.
pub enum SequencedIter<T> {
    /// Dense sequence numbers.
    Bucket(BucketIter<T>),
    /// Sparse sequence numbers.
    Heap(HeapIter<T>),
}

impl<'a, A: Sequenced> SequencedIter<&'a A> {
    /// Creates a sequence-ordered iterator over the trie rooted at `root`,
    /// choosing the strategy by the density of `[first, last]`.
    #[must_use]
    pub fn new<P: SharedPointerKind>(
        root: &'a Node<A, P>,
        size: usize,
        first: i32,
        last: i32,
        reversed: bool,
    ) -> Self {
        Self::with_strategy(root, size, first, last, reversed, Strategy::Auto)
    }

    /// Like [`new`](Self::new) with an explicit strategy.
    #[must_use]
    pub fn with_strategy<P: SharedPointerKind>(
        root: &'a Node<A, P>,
        size: usize,
        first: i32,
        last: i32,
        reversed: bool,
        strategy: Strategy,
    ) -> Self {
        let bucket = match strategy {
            Strategy::Auto => bucket_supported(size, first, last),
            Strategy::Bucket => true,
            Strategy::Heap => false,
        };
        let items = Iter::new(root, size);
        if bucket {
            Self::Bucket(BucketIter::new(items, size, first, last, reversed))
        } else {
            Self::Heap(HeapIter::new(items, reversed))
        }
    }
}

impl<T> SequencedIter<T> {
    /// Returns the strategy this iterator was built with.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Bucket(_) => Strategy::Bucket,
            Self::Heap(_) => Strategy::Heap,
        }
    }
}

impl<T> Iterator for SequencedIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            Self::Bucket(it) => it.next(),
            Self::Heap(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Bucket(it) => it.size_hint(),
            Self::Heap(it) => it.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for SequencedIter<T> {}

impl<T> FusedIterator for SequencedIter<T> {}

// ---------------------------------------------------------------------------
// Removal hook and modification guard
// ---------------------------------------------------------------------------

/// Iterator wrapper whose [`remove`](Self::remove) hands the last yielded
/// item to a callback, typically one that removes it from a live collection
/// while the wrapped iterator walks a snapshot.
///
/// There is no modification guard; wrap in [`FailFast`] for one.
pub struct Removable<I: Iterator, R> {
    inner: I,
    current: Option<I::Item>,
    on_remove: R,
}

impl<I, R> Removable<I, R>
where
    I: Iterator,
    I::Item: Clone,
    R: FnMut(I::Item),
{
    /// Wraps `inner`; `on_remove` receives each removed item.
    pub const fn new(inner: I, on_remove: R) -> Self {
        Self {
            inner,
            current: None,
            on_remove,
        }
    }

    /// Removes the item last returned by `next`.
    ///
    /// # Panics
    ///
    /// Panics if `next` has not yielded an item since the last removal.
    pub fn remove(&mut self) {
        let item = self
            .current
            .take()
            .expect("remove() without a current element");
        (self.on_remove)(item);
    }
}

impl<I, R> Iterator for Removable<I, R>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.current = self.inner.next();
        self.current.clone()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator wrapper that fails fast when the underlying collection is
/// modified behind its back.
///
/// Takes a snapshot of a modification counter at construction and compares
/// it against `live()` on every call. [`has_next`](Self::has_next) looks one
/// item ahead and holds it until the next call to `next`.
pub struct FailFast<I: Iterator, F> {
    inner: I,
    expected: u64,
    live: F,
    current: Option<I::Item>,
    peeked: Option<Option<I::Item>>,
}

impl<I, F> FailFast<I, F>
where
    I: Iterator,
    I::Item: Clone,
    F: Fn() -> u64,
{
    /// Wraps `inner`, snapshotting `live()`.
    pub fn new(inner: I, live: F) -> Self {
        let expected = live();
        Self {
            inner,
            expected,
            live,
            current: None,
            peeked: None,
        }
    }

    fn check(&self) {
        let actual = (self.live)();
        assert!(
            actual == self.expected,
            "concurrent modification: mod count changed from {} to {actual}",
            self.expected
        );
    }

    /// Returns `true` if another item is available. The item is pulled from
    /// the wrapped iterator and handed out by the next call to `next`.
    ///
    /// # Panics
    ///
    /// Panics on concurrent modification.
    pub fn has_next(&mut self) -> bool {
        self.check();
        let inner = &mut self.inner;
        self.peeked.get_or_insert_with(|| inner.next()).is_some()
    }

    /// Removes the item last returned by `next` through `remove_fn`, which
    /// is expected to modify the collection; the new counter value is
    /// adopted as the expected one.
    ///
    /// # Panics
    ///
    /// Panics on concurrent modification, or if `next` has not yielded an
    /// item since the last removal.
    pub fn remove_with<R: FnOnce(I::Item)>(&mut self, remove_fn: R) {
        self.check();
        let item = self
            .current
            .take()
            .expect("remove() without a current element");
        remove_fn(item);
        self.expected = (self.live)();
    }
}

impl<I, F> Iterator for FailFast<I, F>
where
    I: Iterator,
    I::Item: Clone,
    F: Fn() -> u64,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.check();
        let item = self.peeked.take().unwrap_or_else(|| self.inner.next());
        self.current.clone_from(&item);
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.peeked {
            Some(None) => (0, Some(0)),
            Some(Some(_)) => {
                let (lower, upper) = self.inner.size_hint();
                (
                    lower.saturating_add(1),
                    upper.and_then(|n| n.checked_add(1)),
                )
            }
            None => self.inner.size_hint(),
        }
    }
}
