use std::{
    fmt,
    rc::{Rc, Weak},
};

use tracing::debug;

use super::{
    Accessor, Change, StoreError,
    observable::ObservableValue,
    registry::Subscription,
};

const UNLABELED: &str = "<unlabeled>";

/// Whether a store owns its state or views a parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// The store owns its value.
    Root,
    /// A scoped store whose ancestors are all alive.
    Linked,
    /// A scoped store that lost an ancestor. Terminal: reads return the last
    /// propagated value and writes are dropped.
    Unlinked,
}

/// A shared, observable value container.
///
/// `Store` is a handle: clones share the same state and subscribers. It
/// offers a value feed (current value on subscribe, then every update), a
/// change feed (`(old, new)` per update) and scoping through an
/// [`Accessor`].
///
/// Every update notifies, in this order: value subscribers in registration
/// order, then change subscribers in registration order. All of it happens
/// on the calling thread before `update` returns. A store is not `Send`; it
/// lives on the thread that created it.
///
/// # Scoped stores
///
/// [`scope`](Self::scope) returns a `Store<Field>` backed by the parent. Its
/// writes go to the parent, which then notifies its own subscribers with the
/// full value and pushes the re-derived field back into the scoped store.
/// Every parent update republishes the field, changed or not.
///
/// A scoped store does not keep its parent alive. Once the parent (or any
/// further ancestor) is dropped the scoped store is [`LinkState::Unlinked`]:
/// it keeps returning the last value it saw, [`update`](Self::update) becomes
/// a no-op and [`try_update`](Self::try_update) reports
/// [`StoreError::Unlinked`].
pub struct Store<T> {
    inner: Rc<StoreInner<T>>,
}

struct StoreInner<T> {
    label: Option<String>,
    value: ObservableValue<T>,
    source: Source<T>,
}

enum Source<T> {
    Root,
    Scoped(ScopeLink<T>),
}

struct ScopeLink<T> {
    write_through: Box<dyn Fn(T) -> Result<(), StoreError>>,
    linked: Box<dyn Fn() -> bool>,
    _propagation: Subscription,
}

impl<T: Clone + 'static> StoreInner<T> {
    fn try_write(&self, value: T) -> Result<(), StoreError> {
        match &self.source {
            Source::Root => {
                self.value.write(value);
                Ok(())
            }
            Source::Scoped(link) => (link.write_through)(value),
        }
    }

    fn link_state(&self) -> LinkState {
        match &self.source {
            Source::Root => LinkState::Root,
            Source::Scoped(link) if (link.linked)() => LinkState::Linked,
            Source::Scoped(_) => LinkState::Unlinked,
        }
    }

    fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or(UNLABELED)
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Creates a root store holding `initial`.
    pub fn new(initial: T) -> Self {
        Self::root(initial, None)
    }

    /// Creates a root store with a diagnostic label used in log events.
    pub fn labeled(initial: T, label: impl Into<String>) -> Self {
        Self::root(initial, Some(label.into()))
    }

    fn root(initial: T, label: Option<String>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                label,
                value: ObservableValue::new(initial),
                source: Source::Root,
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn value(&self) -> T {
        self.inner.value.read()
    }

    /// Runs `f` against the current value without cloning it.
    ///
    /// `f` must not update this store.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.value.with(f)
    }

    /// The diagnostic label, if one was given.
    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Replaces the whole value.
    ///
    /// On an unlinked scoped store the write is dropped.
    pub fn update(&self, new_value: T) {
        if let Err(err) = self.try_update(new_value) {
            debug!(error = %err, "dropping write");
        }
    }

    /// Replaces the whole value, reporting a write that could not be applied.
    ///
    /// # Errors
    /// * `StoreError::Unlinked` - If this is a scoped store whose parent is gone
    pub fn try_update(&self, new_value: T) -> Result<(), StoreError> {
        self.inner.try_write(new_value)
    }

    /// Replaces the part of the value selected by `accessor`.
    ///
    /// Subscribers see an ordinary full update carrying the resulting value.
    ///
    /// # Arguments
    /// * `field` - The new value for the selected part
    /// * `accessor` - Selects the part of the value to replace
    pub fn update_at<F>(&self, field: F, accessor: &Accessor<T, F>)
    where
        F: 'static,
    {
        if let Err(err) = self.try_update_at(field, accessor) {
            debug!(error = %err, "dropping partial write");
        }
    }

    /// Fallible form of [`update_at`](Self::update_at).
    ///
    /// # Errors
    /// * `StoreError::Unlinked` - If this is a scoped store whose parent is gone
    pub fn try_update_at<F>(&self, field: F, accessor: &Accessor<T, F>) -> Result<(), StoreError>
    where
        F: 'static,
    {
        let root = accessor.with(self.value(), field);
        self.try_update(root)
    }

    /// Subscribes to the value feed.
    ///
    /// `callback` runs once with the current value before this returns, then
    /// once per update.
    pub fn subscribe_receive_value<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.inner.value.subscribe_values(callback, true)
    }

    /// Subscribes to the change feed.
    ///
    /// `callback` is not called on subscribe, only once per later update.
    pub fn subscribe_receive_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Change<T>) + 'static,
    {
        self.inner.value.subscribe_changes(callback)
    }

    /// Derives a store that views and edits the part of this store selected
    /// by `accessor`.
    pub fn scope<F>(&self, accessor: Accessor<T, F>) -> Store<F>
    where
        F: Clone + 'static,
    {
        self.build_scope(accessor, None)
    }

    /// Like [`scope`](Self::scope), labeling the child `"<parent>.<suffix>"`.
    ///
    /// # Arguments
    /// * `accessor` - Selects the part of this store the child views
    /// * `suffix` - Appended to this store's label to name the child
    pub fn scope_labeled<F>(&self, accessor: Accessor<T, F>, suffix: &str) -> Store<F>
    where
        F: Clone + 'static,
    {
        let label = match self.label() {
            Some(parent) => format!("{parent}.{suffix}"),
            None => suffix.to_string(),
        };

        self.build_scope(accessor, Some(label))
    }

    fn build_scope<F>(&self, accessor: Accessor<T, F>, label: Option<String>) -> Store<F>
    where
        F: Clone + 'static,
    {
        let initial = self.inner.value.with(|root| accessor.get(root));
        let parent = Rc::downgrade(&self.inner);

        debug!(
            parent = self.inner.label_or_default(),
            child = label.as_deref().unwrap_or(UNLABELED),
            "creating scoped store"
        );

        let inner = Rc::new_cyclic(|child: &Weak<StoreInner<F>>| {
            let propagate_to = child.clone();
            let propagate_from = parent.clone();
            let getter = accessor.clone();
            // Derive from the live parent value: a re-entrant write may have
            // superseded the root this pass was started with.
            let propagation = self.inner.value.subscribe_values(
                move |_: &T| {
                    let (Some(child), Some(parent)) =
                        (propagate_to.upgrade(), propagate_from.upgrade())
                    else {
                        return;
                    };
                    let field = parent.value.with(|root| getter.get(root));
                    child.value.write(field);
                },
                false,
            );

            let write_parent = parent.clone();
            let unlinked_label = label.clone().unwrap_or_else(|| UNLABELED.to_string());
            let write_through = move |field: F| -> Result<(), StoreError> {
                let unlinked = || StoreError::Unlinked {
                    label: unlinked_label.clone(),
                };
                let parent = write_parent.upgrade().ok_or_else(unlinked)?;
                let root = accessor.with(parent.value.read(), field);
                // Report the store that received the write, not the ancestor
                // that broke the chain.
                parent.try_write(root).map_err(|_| unlinked())
            };

            let linked = move || {
                parent
                    .upgrade()
                    .is_some_and(|parent| parent.link_state() != LinkState::Unlinked)
            };

            StoreInner {
                label,
                value: ObservableValue::new(initial),
                source: Source::Scoped(ScopeLink {
                    write_through: Box::new(write_through),
                    linked: Box::new(linked),
                    _propagation: propagation,
                }),
            }
        });

        Store { inner }
    }

    /// Current position in the link state machine.
    pub fn link_state(&self) -> LinkState {
        self.inner.link_state()
    }

    /// Whether writes reach canonical state: true for root stores and for
    /// scoped stores with every ancestor alive.
    pub fn is_linked(&self) -> bool {
        self.link_state() != LinkState::Unlinked
    }

    /// Active registrations on both feeds, including those held by scoped
    /// stores derived from this one.
    pub fn subscriber_count(&self) -> usize {
        self.inner.value.subscriber_count()
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.label)
            .field("value", &self.inner.value)
            .field("link_state", &self.link_state())
            .finish()
    }
}
