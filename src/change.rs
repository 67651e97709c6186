//! Outcome records of single trie updates and removals.

/// What a single update or removal did to the trie.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChangeKind {
    /// The key was absent (removal) or its payload was kept (update).
    Unchanged,
    /// A new payload was inserted.
    Added,
    /// An existing payload was replaced.
    Updated,
    /// An existing payload was removed.
    Removed,
}

/// Outcome of [`update`](crate::ops::update) or [`remove`](crate::ops::remove).
///
/// `displaced` holds whichever payload is no longer reachable from the trie
/// after the call: the previous payload for [`Updated`](ChangeKind::Updated)
/// and [`Removed`](ChangeKind::Removed), the rejected candidate when an
/// update kept the stored payload, and nothing otherwise.
#[derive(Debug)]
pub struct ChangeEvent<A> {
    kind: ChangeKind,
    displaced: Option<A>,
}

impl<A> ChangeEvent<A> {
    pub(crate) const fn unchanged() -> Self {
        Self {
            kind: ChangeKind::Unchanged,
            displaced: None,
        }
    }

    pub(crate) const fn kept(candidate: A) -> Self {
        Self {
            kind: ChangeKind::Unchanged,
            displaced: Some(candidate),
        }
    }

    pub(crate) const fn added() -> Self {
        Self {
            kind: ChangeKind::Added,
            displaced: None,
        }
    }

    pub(crate) const fn updated(old: A) -> Self {
        Self {
            kind: ChangeKind::Updated,
            displaced: Some(old),
        }
    }

    pub(crate) const fn removed(old: A) -> Self {
        Self {
            kind: ChangeKind::Removed,
            displaced: Some(old),
        }
    }

    /// Returns the kind of change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Returns `true` if the trie changed.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        !matches!(self.kind, ChangeKind::Unchanged)
    }

    /// Returns `true` if an existing payload was replaced.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self.kind, ChangeKind::Updated)
    }

    /// Returns `true` if a payload was added.
    #[must_use]
    pub const fn is_added(&self) -> bool {
        matches!(self.kind, ChangeKind::Added)
    }

    /// Returns `true` if a payload was removed.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self.kind, ChangeKind::Removed)
    }

    /// Returns the displaced payload, if any.
    #[must_use]
    pub const fn displaced(&self) -> Option<&A> {
        self.displaced.as_ref()
    }

    /// Consumes the event, returning the displaced payload.
    #[must_use]
    pub fn into_displaced(self) -> Option<A> {
        self.displaced
    }
}
