//! Trie operations over a root handle: lookup, update, removal.
//!
//! Every mutating operation takes the live [`Mutator`] of the calling batch.
//! A node is edited in place only when it carries the batch's tag and the
//! handle to it is unique; otherwise it is copied, the copy is stamped with
//! the tag and installed in place of the original handle. Operations that
//! end up changing nothing leave every handle untouched, so callers can
//! detect no-ops with [`SharedPointer::ptr_eq`].

use archery::{SharedPointer, SharedPointerKind};

use crate::mutator::Mutator;
use crate::node::{BitmapNode, CollisionNode, Node, NodeRef};

mod get;
mod insert;
mod remove;

pub use get::find;
pub use insert::{Merge, update};
pub use remove::remove;

/// Returns the node behind `slot` for in-place editing if the batch owns it.
fn owned<'a, A, P>(slot: &'a mut NodeRef<A, P>, mutator: &Mutator) -> Option<&'a mut Node<A, P>>
where
    P: SharedPointerKind,
{
    if mutator.owns(slot.owner()) {
        SharedPointer::get_mut(slot)
    } else {
        None
    }
}

/// Makes the node behind `slot` editable by the batch, copying it first
/// unless the batch already owns it.
fn edit<'a, A, P>(slot: &'a mut NodeRef<A, P>, mutator: &mut Mutator) -> &'a mut Node<A, P>
where
    A: Clone,
    P: SharedPointerKind,
{
    if owned(slot, mutator).is_none() {
        let mut copy = (**slot).clone();
        copy.set_owner(mutator.id());
        *slot = copy.alloc(mutator);
    }
    SharedPointer::make_mut(slot)
}

fn as_bitmap<A, P: SharedPointerKind>(node: &Node<A, P>) -> &BitmapNode<A, P> {
    match node {
        Node::Bitmap(n) => n,
        Node::Collision(_) => unreachable!("expected a bitmap node"),
    }
}

fn as_bitmap_mut<A, P: SharedPointerKind>(node: &mut Node<A, P>) -> &mut BitmapNode<A, P> {
    match node {
        Node::Bitmap(n) => n,
        Node::Collision(_) => unreachable!("expected a bitmap node"),
    }
}

fn as_collision_mut<A, P: SharedPointerKind>(node: &mut Node<A, P>) -> &mut CollisionNode<A> {
    match node {
        Node::Collision(n) => n,
        Node::Bitmap(_) => unreachable!("expected a collision node"),
    }
}
