//! Unit tests for the store module.
//! Everything runs synchronously on the test thread.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::field;
use crate::store::{Accessor, Change, LinkState, Store, StoreError, Subscription, Subscriptions};

#[derive(Debug, Clone, PartialEq, Default)]
struct Profile {
    name: String,
    address: Address,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Address {
    city: String,
    zip: u32,
}

fn profile() -> Profile {
    Profile {
        name: "ada".to_string(),
        address: Address {
            city: "london".to_string(),
            zip: 1815,
        },
    }
}

fn record_values<T: Clone + 'static>(store: &Store<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = store.subscribe_receive_value(move |v: &T| sink.borrow_mut().push(v.clone()));
    (seen, sub)
}

fn record_changes<T: Clone + 'static>(
    store: &Store<T>,
) -> (Rc<RefCell<Vec<Change<T>>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = store.subscribe_receive_change(move |c: &Change<T>| sink.borrow_mut().push(c.clone()));
    (seen, sub)
}

mod feeds {
    use super::*;

    #[test]
    fn value_feed_delivers_current_value_on_subscribe() {
        let store = Store::new(41);
        let (seen, _sub) = record_values(&store);

        assert_eq!(*seen.borrow(), vec![41]);
    }

    #[test]
    fn change_feed_is_silent_on_subscribe() {
        let store = Store::new(41);
        let (seen, _sub) = record_changes(&store);

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn every_update_notifies_once_in_call_order() {
        let store = Store::new(0);
        let (values, _v) = record_values(&store);
        let (changes, _c) = record_changes(&store);

        store.update(1);
        store.update(1);
        store.update(2);

        assert_eq!(*values.borrow(), vec![0, 1, 1, 2]);
        assert_eq!(
            *changes.borrow(),
            vec![Change::new(0, 1), Change::new(1, 1), Change::new(1, 2)]
        );
    }

    #[test]
    fn value_subscribers_run_before_change_subscribers() {
        let store = Store::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let change_order = Rc::clone(&order);
        let _c = store.subscribe_receive_change(move |_| change_order.borrow_mut().push("change"));
        let value_order = Rc::clone(&order);
        let _v = store.subscribe_receive_value(move |_| value_order.borrow_mut().push("value"));

        order.borrow_mut().clear();
        store.update(1);

        assert_eq!(*order.borrow(), vec!["value", "change"]);
    }

    #[test]
    fn clones_share_state_and_subscribers() {
        let store = Store::new("a".to_string());
        let handle = store.clone();
        let (seen, _sub) = record_values(&store);

        handle.update("b".to_string());

        assert_eq!(store.value(), "b");
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn with_reads_without_cloning() {
        let store = Store::new(profile());

        let zip = store.with(|p| p.address.zip);

        assert_eq!(zip, 1815);
    }
}

mod disposal {
    use super::*;

    #[test]
    fn dropped_token_stops_delivery() {
        let store = Store::new(0);
        let (seen, sub) = record_values(&store);

        store.update(1);
        drop(sub);
        store.update(2);

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn disposed_token_stops_delivery_and_can_be_disposed_again() {
        let store = Store::new(0);
        let (seen, sub) = record_changes(&store);

        sub.dispose();
        sub.dispose();
        store.update(1);

        assert!(seen.borrow().is_empty());
        assert!(!sub.is_active());
    }

    #[test]
    fn subscription_added_during_notify_waits_for_next_pass() {
        let store = Store::new(0);
        let late_hits = Rc::new(Cell::new(0));
        let held = Rc::new(RefCell::new(Vec::new()));

        let handle = store.clone();
        let hits = Rc::clone(&late_hits);
        let keep = Rc::clone(&held);
        let _sub = store.subscribe_receive_change(move |_| {
            let hits = Rc::clone(&hits);
            keep.borrow_mut().push(
                handle.subscribe_receive_change(move |_| hits.set(hits.get() + 1)),
            );
        });

        store.update(1);
        assert_eq!(late_hits.get(), 0);

        store.update(2);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn subscription_disposed_during_notify_is_skipped() {
        let store = Store::new(0);
        let victim_hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _killer = store.subscribe_receive_change(move |_| {
            slot.borrow_mut().take();
        });

        let hits = Rc::clone(&victim_hits);
        *victim.borrow_mut() =
            Some(store.subscribe_receive_change(move |_| hits.set(hits.get() + 1)));

        store.update(1);
        store.update(2);

        assert_eq!(victim_hits.get(), 0);
    }

    #[test]
    fn callback_may_dispose_itself() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let own: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let counter = Rc::clone(&hits);
        let slot = Rc::clone(&own);
        *own.borrow_mut() = Some(store.subscribe_receive_change(move |_| {
            counter.set(counter.get() + 1);
            if let Some(sub) = slot.borrow().as_ref() {
                sub.dispose();
            }
        }));

        store.update(1);
        store.update(2);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn bag_owns_tokens_until_dropped() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));

        let mut bag = Subscriptions::new();
        for _ in 0..2 {
            let counter = Rc::clone(&hits);
            bag.push(store.subscribe_receive_change(move |_| counter.set(counter.get() + 1)));
        }

        store.update(1);
        drop(bag);
        store.update(2);

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn detached_token_keeps_receiving() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        store
            .subscribe_receive_change(move |_| counter.set(counter.get() + 1))
            .detach();

        store.update(1);

        assert_eq!(hits.get(), 1);
        assert_eq!(store.subscriber_count(), 1);
    }
}

mod partial_updates {
    use super::*;

    #[test]
    fn update_at_replaces_only_the_selected_field() {
        let store = Store::new(profile());
        let (changes, _sub) = record_changes(&store);

        store.update_at(90210, &field!(Profile => address.zip));

        let mut expected = profile();
        expected.address.zip = 90210;
        assert_eq!(store.value(), expected);
        assert_eq!(*changes.borrow(), vec![Change::new(profile(), expected)]);
    }

    #[test]
    fn update_at_with_composed_accessor() {
        let store = Store::new(profile());
        let city = field!(Profile => address).then(&field!(Address => city));

        store.update_at("paris".to_string(), &city);

        assert_eq!(store.value().address.city, "paris");
        assert_eq!(store.value().name, "ada");
    }

    #[test]
    fn change_helpers_project_both_sides() {
        let store = Store::new(profile());
        let (changes, _sub) = record_changes(&store);

        store.update_at("grace".to_string(), &field!(Profile => name));

        let change = changes.borrow()[0].clone();
        assert!(change.changed_by(|p| p.name.clone()));
        assert!(!change.changed_by(|p| p.address.clone()));
        assert_eq!(change.map(|p| p.name.len()), Change::new(3, 5));
    }
}

mod scoping {
    use super::*;

    #[test]
    fn scoped_store_starts_with_the_projected_value() {
        let store = Store::new(profile());
        let address = store.scope(field!(Profile => address));

        assert_eq!(address.value(), profile().address);
        assert_eq!(address.link_state(), LinkState::Linked);
        assert_eq!(store.link_state(), LinkState::Root);
    }

    #[test]
    fn scoped_write_fires_each_level_once() {
        let store = Store::new(profile());
        let zip = store.scope(field!(Profile => address.zip));
        let (root_values, _r) = record_values(&store);
        let (zip_values, _z) = record_values(&zip);
        let (zip_changes, _zc) = record_changes(&zip);

        zip.update(10001);

        assert_eq!(root_values.borrow().len(), 2);
        assert_eq!(root_values.borrow()[1].address.zip, 10001);
        assert_eq!(*zip_values.borrow(), vec![1815, 10001]);
        assert_eq!(*zip_changes.borrow(), vec![Change::new(1815, 10001)]);
    }

    #[test]
    fn parent_update_republishes_unchanged_field() {
        let store = Store::new(profile());
        let city = store.scope(field!(Profile => address.city));
        let (seen, _sub) = record_values(&city);

        store.update_at("grace".to_string(), &field!(Profile => name));

        assert_eq!(
            *seen.borrow(),
            vec!["london".to_string(), "london".to_string()]
        );
    }

    #[test]
    fn nested_scopes_write_through_to_the_root() {
        let store = Store::new(profile());
        let address = store.scope(field!(Profile => address));
        let zip = address.scope(field!(Address => zip));
        let (root_values, _r) = record_values(&store);
        let (address_values, _a) = record_values(&address);

        zip.update(7);

        assert_eq!(store.value().address.zip, 7);
        assert_eq!(address.value().zip, 7);
        assert_eq!(zip.value(), 7);
        assert_eq!(root_values.borrow().len(), 2);
        assert_eq!(address_values.borrow().len(), 2);
    }

    #[test]
    fn overlapping_scopes_last_write_wins() {
        let store = Store::new(profile());
        let address = store.scope(field!(Profile => address));
        let zip = store.scope(field!(Profile => address.zip));

        zip.update(1);
        address.update(Address {
            city: "oslo".to_string(),
            zip: 2,
        });

        assert_eq!(zip.value(), 2);
        assert_eq!(store.value().address.city, "oslo");
    }

    #[test]
    fn dropping_a_scope_removes_its_parent_registration() {
        let store = Store::new(profile());
        let address = store.scope(field!(Profile => address));
        assert_eq!(store.subscriber_count(), 1);

        drop(address);

        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn scope_outliving_parent_becomes_unlinked() {
        let store = Store::labeled(profile(), "profile");
        let zip = store.scope_labeled(field!(Profile => address.zip), "zip");
        let (seen, _sub) = record_values(&zip);

        drop(store);

        assert_eq!(zip.link_state(), LinkState::Unlinked);
        assert_eq!(zip.value(), 1815);

        zip.update(1);
        assert_eq!(zip.value(), 1815);
        assert_eq!(
            zip.try_update(2),
            Err(StoreError::Unlinked {
                label: "profile.zip".to_string()
            })
        );
        assert_eq!(*seen.borrow(), vec![1815]);
    }

    #[test]
    fn losing_a_grandparent_unlinks_the_whole_chain() {
        let store = Store::new(profile());
        let address = store.scope(field!(Profile => address));
        let zip = address.scope(field!(Address => zip));

        drop(store);

        assert!(!address.is_linked());
        assert!(!zip.is_linked());
        assert!(zip.try_update(3).is_err());
    }

    #[test]
    fn unlinked_error_names_the_store_that_was_written() {
        let store = Store::labeled(profile(), "profile");
        let address = store.scope_labeled(field!(Profile => address), "address");
        let zip = address.scope_labeled(field!(Address => zip), "zip");

        drop(store);

        assert_eq!(
            zip.try_update(3),
            Err(StoreError::Unlinked {
                label: "profile.address.zip".to_string()
            })
        );
    }

    #[test]
    fn identity_scope_mirrors_the_parent() {
        let store = Store::new(5);
        let mirror = store.scope(Accessor::identity());

        mirror.update(6);
        assert_eq!(store.value(), 6);

        store.update(7);
        assert_eq!(mirror.value(), 7);
    }

    #[test]
    fn labels_compose_along_the_scope_chain() {
        let store = Store::labeled(profile(), "profile");
        let address = store.scope_labeled(field!(Profile => address), "address");
        let zip = address.scope_labeled(field!(Address => zip), "zip");

        assert_eq!(zip.label(), Some("profile.address.zip"));
        assert_eq!(store.scope(field!(Profile => name)).label(), None);
    }
}

mod reentrancy {
    use super::*;

    #[test]
    fn callback_may_update_the_store_it_observes() {
        let store = Store::new(0);
        let (seen, _v) = record_values(&store);

        let handle = store.clone();
        let _clamp = store.subscribe_receive_change(move |change: &Change<i32>| {
            if change.new > 10 {
                handle.update(10);
            }
        });

        store.update(50);

        assert_eq!(store.value(), 10);
        assert_eq!(*seen.borrow(), vec![0, 50, 10]);
    }

    #[test]
    fn scope_tracks_parent_rewritten_by_an_earlier_subscriber() {
        let store = Store::new(0);

        let handle = store.clone();
        let _clamp = store.subscribe_receive_value(move |v: &i32| {
            if *v > 10 {
                handle.update(10);
            }
        });
        let mirror = store.scope(Accessor::identity());
        let (seen, _m) = record_values(&mirror);

        store.update(50);

        assert_eq!(store.value(), 10);
        assert_eq!(mirror.value(), store.value());
        assert_eq!(seen.borrow().last(), Some(&10));
    }

    #[test]
    #[should_panic(expected = "subscriber failure")]
    fn callback_panics_reach_the_mutator() {
        let store = Store::new(0);
        let _sub = store.subscribe_receive_change(|_| panic!("subscriber failure"));

        store.update(1);
    }
}
