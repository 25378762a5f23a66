//! Observable value containers with scoped views.
//!
//! A [`Store`] holds one value and notifies two feeds on every update: the
//! value feed and the change feed. [`Store::scope`] derives a child store
//! bound to a field of the parent through an [`Accessor`]; the two stay in
//! sync in both directions.
//!
//! Subscriptions are owned [`Subscription`] tokens. Dropping a token ends
//! the subscription; [`Subscriptions`] groups tokens owned by one component.

mod accessor;
mod changes;
mod observable;
mod registry;
mod store;

#[cfg(test)]
mod tests;

pub use accessor::Accessor;
pub use changes::{Change, StoreError};
pub use observable::ObservableValue;
pub use registry::{Subscription, SubscriptionRegistry, Subscriptions};
pub use store::{LinkState, Store};
