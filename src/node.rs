//! CHAMP trie node types and bitmap helpers.

use std::fmt;

use archery::{SharedPointer, SharedPointerKind};

use crate::mutator::{Mutator, MutatorId};

/// Bits per trie level (5 → 32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Width of the trie hash in bits.
pub const HASH_BITS: u32 = 32;

/// Maximum bit-shift of a bitmap level (depth 6, last level uses 2 bits).
///
/// Two payloads whose hashes agree on every level up to and including this
/// one end up in a [`CollisionNode`] one level deeper.
pub const MAX_SHIFT: u32 = 30;

/// Maximum number of nodes on a root-to-leaf path: seven bitmap levels plus
/// one collision level.
pub const MAX_DEPTH: usize = 8;

/// Shared handle to a node.
pub type NodeRef<A, P> = SharedPointer<Node<A, P>, P>;

/// One slot of a [`BitmapNode`]: a payload or a child handle.
pub enum Slot<A, P: SharedPointerKind> {
    /// Inline payload.
    Data(A),
    /// Child sub-trie.
    Node(NodeRef<A, P>),
}

/// Bitmap-compressed interior node.
///
/// `slots` holds the payloads in ascending bit order followed by the child
/// handles in descending bit order, without empty slots.
///
/// Invariants: `data_map & node_map == 0` and
/// `slots.len() == popcount(data_map) + popcount(node_map)`.
pub struct BitmapNode<A, P: SharedPointerKind> {
    data_map: u32,
    node_map: u32,
    slots: Vec<Slot<A, P>>,
    owner: Option<MutatorId>,
}

/// Linear node for payloads whose full 32-bit hashes collide.
///
/// Invariant: `entries.len() >= 2`.
pub struct CollisionNode<A> {
    hash: u32,
    entries: Vec<A>,
    owner: Option<MutatorId>,
}

/// CHAMP trie node.
pub enum Node<A, P: SharedPointerKind> {
    /// Bitmap-compressed node at shift `0..=MAX_SHIFT`.
    Bitmap(BitmapNode<A, P>),
    /// Collision node below the last bitmap level.
    Collision(CollisionNode<A>),
}

// ---------------------------------------------------------------------------
// Bitmap helpers
// ---------------------------------------------------------------------------

/// Extracts the 5-bit hash fragment at the given bit-shift depth.
#[inline]
#[must_use]
pub const fn fragment(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & 0x1F
}

/// Returns the single-bit mask for the given fragment (0..31).
#[inline]
#[must_use]
pub const fn mask(frag: u32) -> u32 {
    1 << frag
}

/// Returns the bit position of `hash` at `shift`.
#[inline]
#[must_use]
pub const fn bitpos(hash: u32, shift: u32) -> u32 {
    mask(fragment(hash, shift))
}

/// Returns the compact index of `bit` within `bitmap`.
///
/// Counts the number of set bits below `bit`.
#[inline]
#[must_use]
pub const fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

impl<A, P: SharedPointerKind> Slot<A, P> {
    /// Returns the payload of a data slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a child; the bitmaps rule that out for every
    /// index below the data arity.
    #[must_use]
    pub fn payload(&self) -> &A {
        match self {
            Self::Data(a) => a,
            Self::Node(_) => unreachable!("data region holds a child"),
        }
    }

    /// Returns the handle of a child slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a payload.
    #[must_use]
    pub fn child(&self) -> &NodeRef<A, P> {
        match self {
            Self::Node(n) => n,
            Self::Data(_) => unreachable!("node region holds a payload"),
        }
    }

    fn child_mut(&mut self) -> &mut NodeRef<A, P> {
        match self {
            Self::Node(n) => n,
            Self::Data(_) => unreachable!("node region holds a payload"),
        }
    }

    fn into_payload(self) -> A {
        match self {
            Self::Data(a) => a,
            Self::Node(_) => unreachable!("data region holds a child"),
        }
    }
}

// ---------------------------------------------------------------------------
// BitmapNode
// ---------------------------------------------------------------------------

impl<A, P: SharedPointerKind> BitmapNode<A, P> {
    /// Creates an empty node, the canonical empty root.
    #[must_use]
    pub const fn empty(owner: Option<MutatorId>) -> Self {
        Self {
            data_map: 0,
            node_map: 0,
            slots: Vec::new(),
            owner,
        }
    }

    pub(crate) const fn from_parts(
        owner: Option<MutatorId>,
        data_map: u32,
        node_map: u32,
        slots: Vec<Slot<A, P>>,
    ) -> Self {
        Self {
            data_map,
            node_map,
            slots,
            owner,
        }
    }

    /// Bitmap of positions holding payloads.
    #[must_use]
    pub const fn data_map(&self) -> u32 {
        self.data_map
    }

    /// Bitmap of positions holding children.
    #[must_use]
    pub const fn node_map(&self) -> u32 {
        self.node_map
    }

    /// Number of inline payloads.
    #[must_use]
    pub const fn data_arity(&self) -> usize {
        self.data_map.count_ones() as usize
    }

    /// Number of children.
    #[must_use]
    pub const fn node_arity(&self) -> usize {
        self.node_map.count_ones() as usize
    }

    /// Ownership tag, if the node was created inside a batch.
    #[must_use]
    pub const fn owner(&self) -> Option<MutatorId> {
        self.owner
    }

    /// Returns the payloads in ascending bit order.
    pub fn payloads(&self) -> impl DoubleEndedIterator<Item = &A> {
        self.slots[..self.data_arity()].iter().map(Slot::payload)
    }

    /// Returns the children in ascending bit order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &NodeRef<A, P>> {
        self.slots[self.data_arity()..]
            .iter()
            .rev()
            .map(Slot::child)
    }

    pub(crate) fn data_slots(&self) -> &[Slot<A, P>] {
        &self.slots[..self.data_arity()]
    }

    pub(crate) fn node_slots(&self) -> &[Slot<A, P>] {
        &self.slots[self.data_arity()..]
    }

    const fn node_position(&self, bit: u32) -> usize {
        self.slots.len() - 1 - index(self.node_map, bit)
    }

    /// Returns the payload stored at `bit`.
    ///
    /// The caller must have checked `data_map & bit != 0`.
    #[must_use]
    pub fn data_at(&self, bit: u32) -> &A {
        self.slots[index(self.data_map, bit)].payload()
    }

    /// Returns the child stored at `bit`.
    ///
    /// The caller must have checked `node_map & bit != 0`.
    #[must_use]
    pub fn child_at(&self, bit: u32) -> &NodeRef<A, P> {
        self.slots[self.node_position(bit)].child()
    }

    pub(crate) fn child_at_mut(&mut self, bit: u32) -> &mut NodeRef<A, P> {
        let pos = self.node_position(bit);
        self.slots[pos].child_mut()
    }

    // -- in-place slot surgery; callers obtain `&mut self` through `ops::edit`

    pub(crate) fn insert_value(&mut self, bit: u32, payload: A) {
        self.data_map |= bit;
        let at = index(self.data_map, bit);
        self.slots.insert(at, Slot::Data(payload));
    }

    pub(crate) fn set_value(&mut self, bit: u32, payload: A) -> A {
        let at = index(self.data_map, bit);
        let old = std::mem::replace(&mut self.slots[at], Slot::Data(payload));
        old.into_payload()
    }

    pub(crate) fn remove_value(&mut self, bit: u32) -> A {
        let at = index(self.data_map, bit);
        self.data_map ^= bit;
        self.slots.remove(at).into_payload()
    }

    pub(crate) fn set_node(&mut self, bit: u32, child: NodeRef<A, P>) {
        *self.child_at_mut(bit) = child;
    }

    /// Replaces the payload at `bit` by the child `make(payload)`.
    pub(crate) fn migrate_data_to_node<F>(&mut self, bit: u32, make: F)
    where
        F: FnOnce(A) -> NodeRef<A, P>,
    {
        let old = self.slots.remove(index(self.data_map, bit)).into_payload();
        self.data_map ^= bit;
        self.node_map |= bit;
        let at = self.slots.len() - index(self.node_map, bit);
        self.slots.insert(at, Slot::Node(make(old)));
    }

    /// Replaces the child at `bit` by `payload`.
    pub(crate) fn migrate_node_to_data(&mut self, bit: u32, payload: A) {
        let at = self.node_position(bit);
        self.slots.remove(at);
        self.node_map ^= bit;
        self.data_map |= bit;
        let at = index(self.data_map, bit);
        self.slots.insert(at, Slot::Data(payload));
    }

    /// Moves the only payload of a single-entry node to the position `bit`.
    pub(crate) const fn reposition_single(&mut self, bit: u32) {
        self.data_map = bit;
    }

    pub(crate) fn take_single_payload(&mut self) -> A {
        match self.slots.pop() {
            Some(Slot::Data(a)) if self.slots.is_empty() => a,
            _ => unreachable!("single-entry node holds exactly one payload"),
        }
    }
}

// ---------------------------------------------------------------------------
// CollisionNode
// ---------------------------------------------------------------------------

impl<A> CollisionNode<A> {
    pub(crate) const fn new(owner: Option<MutatorId>, hash: u32, entries: Vec<A>) -> Self {
        Self {
            hash,
            entries,
            owner,
        }
    }

    /// The 32-bit hash shared by every entry.
    #[must_use]
    pub const fn hash(&self) -> u32 {
        self.hash
    }

    /// The colliding payloads, unordered.
    #[must_use]
    pub fn entries(&self) -> &[A] {
        &self.entries
    }

    /// Ownership tag, if the node was created inside a batch.
    #[must_use]
    pub const fn owner(&self) -> Option<MutatorId> {
        self.owner
    }

    pub(crate) const fn entries_mut(&mut self) -> &mut Vec<A> {
        &mut self.entries
    }
}

// ---------------------------------------------------------------------------
// Node accessors
// ---------------------------------------------------------------------------

impl<A, P: SharedPointerKind> Node<A, P> {
    /// Creates the canonical empty root, owned by nobody.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Bitmap(BitmapNode::empty(None))
    }

    /// Allocates `self` as a node of the batch `mutator`.
    pub(crate) fn alloc(self, mutator: &mut Mutator) -> NodeRef<A, P> {
        mutator.record_allocation();
        SharedPointer::new(self)
    }

    /// Ownership tag of this node.
    #[must_use]
    pub const fn owner(&self) -> Option<MutatorId> {
        match self {
            Self::Bitmap(n) => n.owner,
            Self::Collision(n) => n.owner,
        }
    }

    pub(crate) const fn set_owner(&mut self, owner: MutatorId) {
        match self {
            Self::Bitmap(n) => n.owner = Some(owner),
            Self::Collision(n) => n.owner = Some(owner),
        }
    }

    /// Returns the number of inline payloads.
    #[must_use]
    pub const fn data_arity(&self) -> usize {
        match self {
            Self::Bitmap(n) => n.data_arity(),
            Self::Collision(n) => n.entries.len(),
        }
    }

    /// Returns the number of children (always 0 for collision nodes).
    #[must_use]
    pub const fn node_arity(&self) -> usize {
        match self {
            Self::Bitmap(n) => n.node_arity(),
            Self::Collision(_) => 0,
        }
    }

    /// Returns `true` for a bitmap node with no payloads and no children.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Bitmap(n) => n.data_map == 0 && n.node_map == 0,
            Self::Collision(_) => false,
        }
    }

    /// Returns `true` for a bitmap node holding exactly one payload and no
    /// children. Such a node is never kept below the root: its parent
    /// inlines the payload.
    #[must_use]
    pub const fn is_single_entry(&self) -> bool {
        match self {
            Self::Bitmap(n) => n.data_map.is_power_of_two() && n.node_map == 0,
            Self::Collision(_) => false,
        }
    }

    /// Counts the nodes of this sub-trie, `self` included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Bitmap(n) => 1 + n.children().map(|c| c.node_count()).sum::<usize>(),
            Self::Collision(_) => 1,
        }
    }

    /// Counts the payloads of this sub-trie.
    #[must_use]
    pub fn payload_count(&self) -> usize {
        match self {
            Self::Bitmap(n) => {
                n.data_arity() + n.children().map(|c| c.payload_count()).sum::<usize>()
            }
            Self::Collision(n) => n.entries.len(),
        }
    }
}

impl<A: PartialEq, P: SharedPointerKind> Node<A, P> {
    /// Structural equality.
    ///
    /// Bitmaps are compared first, then payloads element-wise, then children
    /// recursively. Shared children short-circuit on pointer identity.
    /// Collision entries are matched in any order.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bitmap(a), Self::Bitmap(b)) => {
                a.data_map == b.data_map
                    && a.node_map == b.node_map
                    && a.payloads().eq(b.payloads())
                    && a.children()
                        .zip(b.children())
                        .all(|(x, y)| SharedPointer::ptr_eq(x, y) || x.equivalent(y))
            }
            (Self::Collision(a), Self::Collision(b)) => {
                if a.hash != b.hash || a.entries.len() != b.entries.len() {
                    return false;
                }
                // Consume a scratch copy of the other list: every match is
                // swapped out so it cannot be matched twice.
                let mut remaining: Vec<&A> = b.entries.iter().collect();
                a.entries.iter().all(|x| {
                    remaining
                        .iter()
                        .position(|y| x == *y)
                        .map(|i| remaining.swap_remove(i))
                        .is_some()
                })
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant checking
// ---------------------------------------------------------------------------

impl<A, P: SharedPointerKind> Node<A, P> {
    /// Validates the structural invariants of the sub-trie rooted here and
    /// returns its payload count.
    ///
    /// `hash_of` recomputes payload hashes so that every payload can be
    /// checked against the path it is stored under.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violated invariant.
    pub fn check_invariants<H>(&self, shift: u32, is_root: bool, hash_of: &H) -> usize
    where
        H: Fn(&A) -> u32,
    {
        match self {
            Self::Bitmap(n) => {
                assert!(shift <= MAX_SHIFT, "bitmap node below the last level");
                assert_eq!(n.data_map & n.node_map, 0, "data and node maps overlap");
                assert_eq!(
                    n.slots.len(),
                    n.data_arity() + n.node_arity(),
                    "slot count does not match the bitmaps"
                );
                if !is_root {
                    assert!(
                        n.data_arity() >= 2 || n.node_arity() >= 1,
                        "non-root node with fewer than two payloads and no children"
                    );
                }
                let mut bits = n.data_map;
                for a in n.payloads() {
                    let bit = bits & bits.wrapping_neg();
                    bits ^= bit;
                    assert_eq!(
                        bitpos(hash_of(a), shift),
                        bit,
                        "payload stored under the wrong bit"
                    );
                }
                let mut count = n.data_arity();
                for child in n.children() {
                    assert!(!child.is_single_entry(), "single-entry child not inlined");
                    count += child.check_invariants(shift + BITS_PER_LEVEL, false, hash_of);
                }
                count
            }
            Self::Collision(n) => {
                assert!(shift > MAX_SHIFT, "collision node above the last level");
                assert!(
                    n.entries.len() >= 2,
                    "collision node with fewer than two entries"
                );
                assert!(
                    n.entries.iter().all(|a| hash_of(a) == n.hash),
                    "collision entry with a foreign hash"
                );
                n.entries.len()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Manual trait impls avoid false `P: Clone` bounds.
// ---------------------------------------------------------------------------

impl<A: Clone, P: SharedPointerKind> Clone for Slot<A, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Data(a) => Self::Data(a.clone()),
            Self::Node(n) => Self::Node(n.clone()),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Clone for BitmapNode<A, P> {
    fn clone(&self) -> Self {
        Self {
            data_map: self.data_map,
            node_map: self.node_map,
            slots: self.slots.clone(),
            owner: self.owner,
        }
    }
}

impl<A: Clone> Clone for CollisionNode<A> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            entries: self.entries.clone(),
            owner: self.owner,
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Clone for Node<A, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Bitmap(n) => Self::Bitmap(n.clone()),
            Self::Collision(n) => Self::Collision(n.clone()),
        }
    }
}

impl<A, P: SharedPointerKind> Default for Node<A, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, P: SharedPointerKind> fmt::Debug for Node<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitmap(n) => f
                .debug_struct("Bitmap")
                .field("data_map", &format_args!("{:#034b}", n.data_map))
                .field("node_map", &format_args!("{:#034b}", n.node_map))
                .field("owner", &n.owner)
                .finish_non_exhaustive(),
            Self::Collision(n) => f
                .debug_struct("Collision")
                .field("hash", &format_args!("{:#010x}", n.hash))
                .field("entries_len", &n.entries.len())
                .field("owner", &n.owner)
                .finish_non_exhaustive(),
        }
    }
}
