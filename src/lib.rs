//! Scopestore - observable value containers with two-way scoped views.
//!
//! The main features include:
//!
//! - [`Store`]: a shared value with a value feed and a change feed
//! - Scoped stores: child stores bound to a field of a parent, kept in sync
//!   in both directions
//! - [`Accessor`]: typed getter/setter pairs, composable, with the
//!   [`field!`] macro for struct field paths
//! - Owned disposal tokens ([`Subscription`], [`Subscriptions`])
//! - Key-path helpers for nested TOML trees ([`nested`])
//!
//! # Quick Start
//!
//! ```rust
//! use scopestore::{Store, field};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Settings {
//!     title: String,
//!     volume: u8,
//! }
//!
//! let settings = Store::new(Settings { title: "main".into(), volume: 30 });
//! let volume = settings.scope(field!(Settings => volume));
//!
//! let _sub = settings.subscribe_receive_change(|change| {
//!     println!("volume {} -> {}", change.old.volume, change.new.volume);
//! });
//!
//! volume.update(45);
//! assert_eq!(settings.value().volume, 45);
//! ```
//!
//! Notifications are synchronous and single-threaded. Stores are not `Send`.

/// Observable stores, accessors and subscriptions.
pub mod store;

/// Key-path access into nested TOML values.
pub mod nested;

/// Re-exported core types for convenience.
pub use store::{Accessor, Change, LinkState, Store, StoreError, Subscription, Subscriptions};
