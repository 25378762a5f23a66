use serde::{Deserialize, Serialize};

/// The before/after snapshot produced by a single store mutation.
///
/// Exactly one `Change` is emitted per write. `old` is the value observed
/// immediately before the write and `new` the value immediately after;
/// intermediate states are never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    /// Value before the mutation.
    pub old: T,
    /// Value after the mutation.
    pub new: T,
}

impl<T> Change<T> {
    /// Creates a change pair.
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }

    /// Projects both sides of the change through `f`.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Change<U> {
        Change {
            old: f(&self.old),
            new: f(&self.new),
        }
    }

    /// Whether the projected part differs between the two snapshots.
    ///
    /// Notifications are never filtered by the store; this is for subscribers
    /// that want to ignore updates that left their field untouched.
    pub fn changed_by<U: PartialEq>(&self, f: impl Fn(&T) -> U) -> bool {
        f(&self.old) != f(&self.new)
    }
}

/// Errors reported by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The scoped store lost its parent and no longer writes through.
    #[error("store '{label}' is unlinked from its parent; write dropped")]
    Unlinked {
        /// Diagnostic label of the unlinked store.
        label: String,
    },
}
