//! Update operation: insert or replace, in place when owned, copy-on-write
//! otherwise.

use archery::SharedPointerKind;

use crate::change::ChangeEvent;
use crate::mutator::Mutator;
use crate::node::{self, BitmapNode, CollisionNode, Node, NodeRef, Slot};
use crate::ops::{as_bitmap, as_bitmap_mut, as_collision_mut, edit, owned};

/// Decision of an update function about a key that is already present.
#[derive(Debug, PartialEq, Eq)]
pub enum Merge<A> {
    /// Keep the stored payload; hands back the rejected candidate.
    Keep(A),
    /// Replace the stored payload with this one.
    Replace(A),
}

/// Inserts `payload` into the trie rooted at `root`, or resolves it against
/// an equal payload already present through `update_fn`.
///
/// - `hash` is the 32-bit hash of `payload`;
/// - `update_fn(stored, candidate)` decides what happens on a key match;
/// - `eq` decides whether two payloads share a key;
/// - `hash_fn` recomputes the hash of a stored payload when two payloads
///   must be pushed one level down.
///
/// `root` is left untouched (pointer-identical) unless the trie changes.
pub fn update<A, P, U, E, H>(
    root: &mut NodeRef<A, P>,
    payload: A,
    hash: u32,
    update_fn: U,
    eq: E,
    hash_fn: H,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    P: SharedPointerKind,
    U: FnOnce(&A, A) -> Merge<A>,
    E: Fn(&A, &A) -> bool,
    H: Fn(&A) -> u32,
{
    update_recursive(root, payload, hash, 0, update_fn, &eq, &hash_fn, mutator)
}

#[allow(clippy::too_many_arguments)]
fn update_recursive<A, P, U, E, H>(
    slot: &mut NodeRef<A, P>,
    payload: A,
    hash: u32,
    shift: u32,
    update_fn: U,
    eq: &E,
    hash_fn: &H,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    P: SharedPointerKind,
    U: FnOnce(&A, A) -> Merge<A>,
    E: Fn(&A, &A) -> bool,
    H: Fn(&A) -> u32,
{
    if matches!(**slot, Node::Collision(_)) {
        update_collision(slot, payload, update_fn, eq, mutator)
    } else {
        update_bitmap(slot, payload, hash, shift, update_fn, eq, hash_fn, mutator)
    }
}

// ---------------------------------------------------------------------------
// Bitmap node update
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn update_bitmap<A, P, U, E, H>(
    slot: &mut NodeRef<A, P>,
    payload: A,
    hash: u32,
    shift: u32,
    update_fn: U,
    eq: &E,
    hash_fn: &H,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    P: SharedPointerKind,
    U: FnOnce(&A, A) -> Merge<A>,
    E: Fn(&A, &A) -> bool,
    H: Fn(&A) -> u32,
{
    let bit = node::bitpos(hash, shift);
    let next_shift = shift + node::BITS_PER_LEVEL;
    let current_node = as_bitmap(&**slot);

    if current_node.data_map() & bit != 0 {
        let current = current_node.data_at(bit);
        if eq(current, &payload) {
            // Same key → let the update function decide.
            return match update_fn(current, payload) {
                Merge::Keep(candidate) => ChangeEvent::kept(candidate),
                Merge::Replace(replacement) => {
                    let old = as_bitmap_mut(edit(slot, mutator)).set_value(bit, replacement);
                    ChangeEvent::updated(old)
                }
            };
        }
        // Different key at same position → push both into a subtree.
        let current_hash = hash_fn(current);
        as_bitmap_mut(edit(slot, mutator)).migrate_data_to_node(bit, |current| {
            merge_two(current, current_hash, payload, hash, next_shift, mutator)
        });
        ChangeEvent::added()
    } else if current_node.node_map() & bit != 0 {
        // Position has a child subtree → recurse, in place when owned.
        if let Some(parent) = owned(slot, mutator) {
            let child = as_bitmap_mut(parent).child_at_mut(bit);
            return update_recursive(
                child,
                payload,
                hash,
                next_shift,
                update_fn,
                eq,
                hash_fn,
                mutator,
            );
        }
        let mut child = as_bitmap(&**slot).child_at(bit).clone();
        let event = update_recursive(
            &mut child,
            payload,
            hash,
            next_shift,
            update_fn,
            eq,
            hash_fn,
            mutator,
        );
        if event.is_modified() {
            as_bitmap_mut(edit(slot, mutator)).set_node(bit, child);
        }
        event
    } else {
        // Position empty → add inline payload.
        as_bitmap_mut(edit(slot, mutator)).insert_value(bit, payload);
        ChangeEvent::added()
    }
}

// ---------------------------------------------------------------------------
// Collision node update
// ---------------------------------------------------------------------------

fn update_collision<A, P, U, E>(
    slot: &mut NodeRef<A, P>,
    payload: A,
    update_fn: U,
    eq: &E,
    mutator: &mut Mutator,
) -> ChangeEvent<A>
where
    A: Clone,
    P: SharedPointerKind,
    U: FnOnce(&A, A) -> Merge<A>,
    E: Fn(&A, &A) -> bool,
{
    let Node::Collision(current_node) = &**slot else {
        unreachable!("expected a collision node");
    };

    if let Some(i) = current_node.entries().iter().position(|a| eq(a, &payload)) {
        return match update_fn(&current_node.entries()[i], payload) {
            Merge::Keep(candidate) => ChangeEvent::kept(candidate),
            Merge::Replace(replacement) => {
                let entries = as_collision_mut(edit(slot, mutator)).entries_mut();
                ChangeEvent::updated(std::mem::replace(&mut entries[i], replacement))
            }
        };
    }

    // Key not found → append.
    let entries = as_collision_mut(edit(slot, mutator)).entries_mut();
    entries.push(payload);
    ChangeEvent::added()
}

// ---------------------------------------------------------------------------
// Subtree creation
// ---------------------------------------------------------------------------

/// Creates a subtree from two payloads that share a position at the parent
/// level.
///
/// Recursively descends until hash fragments differ, or creates a collision
/// node once every bitmap level is consumed.
fn merge_two<A, P>(
    a0: A,
    h0: u32,
    a1: A,
    h1: u32,
    shift: u32,
    mutator: &mut Mutator,
) -> NodeRef<A, P>
where
    P: SharedPointerKind,
{
    let owner = Some(mutator.id());
    if shift > node::MAX_SHIFT {
        debug_assert_eq!(h0, h1, "collision of payloads with different hashes");
        let collision = CollisionNode::new(owner, h0, vec![a0, a1]);
        return Node::Collision(collision).alloc(mutator);
    }

    let f0 = node::fragment(h0, shift);
    let f1 = node::fragment(h1, shift);

    if f0 == f1 {
        let child = merge_two(a0, h0, a1, h1, shift + node::BITS_PER_LEVEL, mutator);
        let bitmap = BitmapNode::from_parts(owner, 0, node::mask(f0), vec![Slot::Node(child)]);
        Node::Bitmap(bitmap).alloc(mutator)
    } else {
        let slots = if f0 < f1 {
            vec![Slot::Data(a0), Slot::Data(a1)]
        } else {
            vec![Slot::Data(a1), Slot::Data(a0)]
        };
        let bitmap = BitmapNode::from_parts(owner, node::mask(f0) | node::mask(f1), 0, slots);
        Node::Bitmap(bitmap).alloc(mutator)
    }
}
