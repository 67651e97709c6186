//! Removal operation: in place when owned, copy-on-write otherwise, with
//! canonical inlining of single-entry subtrees.

use archery::{SharedPointer, SharedPointerKind};

use crate::change::ChangeEvent;
use crate::mutator::Mutator;
use crate::node::{self, BitmapNode, Node, NodeRef, Slot};
use crate::ops::{as_bitmap, as_bitmap_mut, as_collision_mut, edit, owned};

/// Removes the payload matching `key` from the trie rooted at `root`.
///
/// `hash` is the 32-bit hash of `key`. `root` is left untouched
/// (pointer-identical) when no payload matches; it always stays a bitmap
/// node, possibly the empty one.
pub fn remove<A, Q, P, E>(
    root: &mut NodeRef<A, P>,
    key: &Q,
    hash: u32,
    eq: E,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    remove_recursive(root, key, hash, 0, &eq, mutator)
}

fn remove_recursive<A, Q, P, E>(
    slot: &mut NodeRef<A, P>,
    key: &Q,
    hash: u32,
    shift: u32,
    eq: &E,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    if matches!(**slot, Node::Collision(_)) {
        remove_from_collision(slot, key, hash, eq, mutator)
    } else {
        remove_from_bitmap(slot, key, hash, shift, eq, mutator)
    }
}

// ---------------------------------------------------------------------------
// Bitmap node remove
// ---------------------------------------------------------------------------

fn remove_from_bitmap<A, Q, P, E>(
    slot: &mut NodeRef<A, P>,
    key: &Q,
    hash: u32,
    shift: u32,
    eq: &E,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    let bit = node::bitpos(hash, shift);
    let current_node = as_bitmap(&**slot);

    if current_node.data_map() & bit != 0 {
        if !eq(current_node.data_at(bit), key) {
            return ChangeEvent::unchanged();
        }
        let collapses =
            shift != 0 && current_node.data_arity() == 2 && current_node.node_arity() == 0;
        let target = as_bitmap_mut(edit(slot, mutator));
        let old = target.remove_value(bit);
        if collapses {
            // The remaining payload shares every fragment above this level
            // with the removed key, so its root-level position is the
            // removed key's. The parent inlines this node or passes it up.
            target.reposition_single(node::bitpos(hash, 0));
        }
        ChangeEvent::removed(old)
    } else if current_node.node_map() & bit != 0 {
        let next_shift = shift + node::BITS_PER_LEVEL;
        let event = if let Some(parent) = owned(slot, mutator) {
            let child = as_bitmap_mut(parent).child_at_mut(bit);
            remove_recursive(child, key, hash, next_shift, eq, mutator)
        } else {
            let mut child = as_bitmap(&**slot).child_at(bit).clone();
            let event = remove_recursive(&mut child, key, hash, next_shift, eq, mutator);
            if !event.is_modified() {
                return event;
            }
            if child.is_single_entry() && is_sole_child(as_bitmap(&**slot)) {
                *slot = child;
                return event;
            }
            as_bitmap_mut(edit(slot, mutator)).set_node(bit, child);
            event
        };
        if event.is_modified() {
            compact_child(slot, bit);
        }
        event
    } else {
        ChangeEvent::unchanged()
    }
}

const fn is_sole_child<A, P: SharedPointerKind>(node: &BitmapNode<A, P>) -> bool {
    node.data_arity() == 0 && node.node_arity() == 1
}

/// Restores the canonical form after the child at `bit` lost a payload.
///
/// A child left with a single payload is escalated in place of this node
/// when it is the node's only content, and inlined as a payload otherwise.
/// The caller guarantees the node behind `slot` is owned and unique.
#[allow(clippy::option_if_let_else)]
fn compact_child<A, P>(slot: &mut NodeRef<A, P>, bit: u32)
where
    A: Clone,
    P: SharedPointerKind,
{
    let parent = as_bitmap_mut(SharedPointer::make_mut(slot));
    if !parent.child_at(bit).is_single_entry() {
        return;
    }
    if is_sole_child(parent) {
        let child = parent.child_at(bit).clone();
        *slot = child;
    } else {
        let child = parent.child_at_mut(bit);
        let payload = match SharedPointer::get_mut(child) {
            Some(single) => as_bitmap_mut(single).take_single_payload(),
            None => as_bitmap(&**child).data_slots()[0].payload().clone(),
        };
        parent.migrate_node_to_data(bit, payload);
    }
}

// ---------------------------------------------------------------------------
// Collision node remove
// ---------------------------------------------------------------------------

fn remove_from_collision<A, Q, P, E>(
    slot: &mut NodeRef<A, P>,
    key: &Q,
    hash: u32,
    eq: &E,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    let Node::Collision(current_node) = &**slot else {
        unreachable!("expected a collision node");
    };
    if hash != current_node.hash() {
        return ChangeEvent::unchanged();
    }
    let Some(i) = current_node.entries().iter().position(|a| eq(a, key)) else {
        return ChangeEvent::unchanged();
    };

    let owner = Some(mutator.id());
    let entries = as_collision_mut(edit(slot, mutator)).entries_mut();
    let old = entries.remove(i);
    if entries.len() == 1 {
        // A lone survivor becomes a single-entry node positioned for the
        // root level; the parent inlines it or passes it up.
        let remaining = entries.remove(0);
        let single = BitmapNode::from_parts(
            owner,
            node::bitpos(hash, 0),
            0,
            vec![Slot::Data(remaining)],
        );
        *slot = Node::Bitmap(single).alloc(mutator);
    }
    ChangeEvent::removed(old)
}
