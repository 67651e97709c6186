//! Ownership tags for transient (batched) mutation.
//!
//! A [`Mutator`] identifies one mutation batch. Nodes created or copied
//! during the batch carry its [`MutatorId`] and may be edited in place for
//! the rest of the batch. Identity is process-wide unique: ids are drawn from
//! a global counter and never reused.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a mutation batch. Compared by identity, never by
/// content: two ids are equal only if they come from the same [`Mutator`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MutatorId(NonZeroU64);

/// Live handle of a mutation batch.
///
/// Besides the ownership tag it counts the nodes allocated while the batch
/// is active, so callers can observe the in-place fast path.
#[derive(Debug)]
pub struct Mutator {
    id: MutatorId,
    allocations: usize,
}

impl Mutator {
    /// Opens a new batch with a fresh, never-seen id.
    ///
    /// # Panics
    ///
    /// Panics if the process has exhausted 2⁶⁴ − 1 ids.
    #[must_use]
    pub fn new() -> Self {
        let raw = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let id = NonZeroU64::new(raw).expect("mutator id space exhausted");
        log::trace!("opened mutation batch {raw}");
        Self {
            id: MutatorId(id),
            allocations: 0,
        }
    }

    /// Returns the ownership tag of this batch.
    #[must_use]
    pub const fn id(&self) -> MutatorId {
        self.id
    }

    /// Returns `true` if `owner` is this batch's tag.
    #[must_use]
    pub fn owns(&self, owner: Option<MutatorId>) -> bool {
        owner == Some(self.id)
    }

    /// Number of nodes allocated under this batch so far.
    #[must_use]
    pub const fn allocations(&self) -> usize {
        self.allocations
    }

    /// Records one node allocation.
    pub(crate) const fn record_allocation(&mut self) {
        self.allocations += 1;
    }
}

impl Default for Mutator {
    fn default() -> Self {
        Self::new()
    }
}
