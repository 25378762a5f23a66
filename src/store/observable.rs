use std::{cell::RefCell, fmt};

use super::{
    Change,
    registry::{Subscription, SubscriptionRegistry},
};

/// A single mutable value with a value feed and a change feed.
///
/// Every [`write`](Self::write) notifies value subscribers with the new value
/// and then change subscribers with the `(old, new)` pair. Nothing is
/// coalesced or deduplicated. The value is not borrowed while subscribers
/// run, so they may read or write it again.
pub struct ObservableValue<T> {
    current: RefCell<T>,
    values: SubscriptionRegistry<T>,
    changes: SubscriptionRegistry<Change<T>>,
}

impl<T: Clone + 'static> ObservableValue<T> {
    /// Creates an observable holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: RefCell::new(initial),
            values: SubscriptionRegistry::new(),
            changes: SubscriptionRegistry::new(),
        }
    }

    /// Returns a clone of the current value.
    pub fn read(&self) -> T {
        self.current.borrow().clone()
    }

    /// Runs `f` against the current value without cloning it.
    ///
    /// `f` must not write to this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.current.borrow())
    }

    /// Replaces the value and fans the write out to both feeds.
    pub fn write(&self, new: T) {
        let old = self.current.replace(new.clone());

        self.values.notify(&new);
        self.changes.notify(&Change { old, new });
    }

    /// Subscribes to the value feed, optionally receiving the current value
    /// right away.
    pub fn subscribe_values<F>(&self, callback: F, immediate: bool) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        if immediate {
            let current = self.read();
            self.values.subscribe(callback, Some(&current))
        } else {
            self.values.subscribe(callback, None)
        }
    }

    /// Subscribes to the change feed.
    pub fn subscribe_changes<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Change<T>) + 'static,
    {
        self.changes.subscribe(callback, None)
    }

    /// Active registrations across both feeds.
    pub fn subscriber_count(&self) -> usize {
        self.values.len() + self.changes.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("current", &self.current.borrow())
            .field("values", &self.values)
            .field("changes", &self.changes)
            .finish()
    }
}
