use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::trace;

type Callback<T> = Rc<dyn Fn(&T)>;

/// A registered callback. `active` flips to false the moment the entry is
/// removed so that an in-flight notify pass skips it.
struct Entry<T> {
    id: u64,
    active: Cell<bool>,
    callback: Callback<T>,
}

struct RegistryState<T> {
    next_id: u64,
    entries: Vec<Rc<Entry<T>>>,
}

/// Type-erased view of a registry, so that tokens are not generic over the
/// value type they observe.
trait Detach {
    fn detach(&self, id: u64);
    fn contains(&self, id: u64) -> bool;
}

impl<T> Detach for RefCell<RegistryState<T>> {
    fn detach(&self, id: u64) {
        let removed = {
            let mut state = self.borrow_mut();
            state
                .entries
                .iter()
                .position(|entry| entry.id == id)
                .map(|pos| state.entries.remove(pos))
        };

        // Dropped outside the borrow: the callback may own tokens for this
        // same registry.
        if let Some(entry) = removed {
            entry.active.set(false);
        }
    }

    fn contains(&self, id: u64) -> bool {
        self.borrow().entries.iter().any(|entry| entry.id == id)
    }
}

/// An ordered set of callbacks for one value stream.
///
/// Callbacks run synchronously on the notifying thread, in the order they
/// were registered. Each notify pass works on a snapshot taken when the pass
/// starts: callbacks registered during the pass wait for the next one, and
/// callbacks disposed during the pass are skipped if they have not run yet.
///
/// Panics raised by callbacks are not caught.
pub struct SubscriptionRegistry<T> {
    state: Rc<RefCell<RegistryState<T>>>,
}

impl<T: 'static> SubscriptionRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `callback` at the end of the notification order.
    ///
    /// When `initial` is given the callback is invoked with it before this
    /// method returns.
    pub fn subscribe<F>(&self, callback: F, initial: Option<&T>) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let callback: Callback<T> = Rc::new(callback);

        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.entries.push(Rc::new(Entry {
                id,
                active: Cell::new(true),
                callback: Rc::clone(&callback),
            }));
            id
        };

        let registry = Rc::downgrade(&self.state);
        let registry: Weak<dyn Detach> = registry;
        let subscription = Subscription::new(id, registry);

        if let Some(value) = initial {
            callback(value);
        }

        subscription
    }

    /// Invokes every active callback with `value`.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Rc<Entry<T>>> = self.state.borrow().entries.clone();

        trace!(subscribers = snapshot.len(), "notify pass");

        for entry in snapshot {
            if entry.active.get() {
                (entry.callback)(value);
            }
        }
    }

    /// Number of active registrations.
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SubscriptionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.state.borrow().entries.len())
            .finish()
    }
}

/// Disposal token for a single registration.
///
/// Dropping the token, or calling [`dispose`](Self::dispose), removes the
/// registration; no callback fires for it afterwards. Use
/// [`detach`](Self::detach) to keep the registration alive for as long as
/// the registry exists.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
    armed: Cell<bool>,
}

impl Subscription {
    fn new(id: u64, registry: Weak<dyn Detach>) -> Self {
        Self {
            id,
            registry,
            armed: Cell::new(true),
        }
    }

    /// Removes the registration. Calling this more than once is a no-op.
    pub fn dispose(&self) {
        if !self.armed.replace(false) {
            return;
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }

    /// Whether the registration is still present in a live registry.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Releases the token without unsubscribing.
    pub fn detach(self) {
        self.armed.set(false);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// An owned collection of subscriptions that are disposed together.
///
/// Whoever subscribes keeps the bag; dropping it (or calling
/// [`clear`](Self::clear)) ends every subscription it holds.
#[derive(Debug, Default)]
pub struct Subscriptions {
    tokens: Vec<Subscription>,
}

impl Subscriptions {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `subscription`.
    pub fn push(&mut self, subscription: Subscription) {
        self.tokens.push(subscription);
    }

    /// Number of held tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the bag holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Disposes and drops every held token.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

impl Extend<Subscription> for Subscriptions {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}

impl FromIterator<Subscription> for Subscriptions {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
