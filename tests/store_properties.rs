//! Property tests for the Store's quantified invariants (bounded size,
//! LRU-order eviction, TTL expiry) using small randomized input spaces.

use pocket::store::{Store, StoreOptions};
use proptest::prelude::*;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::Duration;

proptest! {
    #[test]
    fn store_never_exceeds_its_capacity(keys in prop::collection::vec(0u32..50, 0..200)) {
        let store = Store::new(StoreOptions {
            max_entries: NonZeroUsize::new(8),
            ..Default::default()
        });
        for k in &keys {
            store.set(k.to_string(), Value::from(*k));
            prop_assert!(store.len() <= 8);
        }
    }

    #[test]
    fn every_set_value_round_trips_until_evicted_or_overwritten(
        pairs in prop::collection::vec((0u32..20, any::<i64>()), 1..100)
    ) {
        let store = Store::new(StoreOptions {
            max_entries: NonZeroUsize::new(1000),
            ..Default::default()
        });
        for (k, v) in &pairs {
            store.set(k.to_string(), Value::from(*v));
        }
        // with capacity far larger than the key space, the last write per
        // key must be exactly what's readable afterward.
        let mut last = std::collections::HashMap::new();
        for (k, v) in &pairs {
            last.insert(*k, *v);
        }
        for (k, v) in last {
            prop_assert_eq!(store.get(&k.to_string()), Some(Value::from(v)));
        }
    }
}

#[test]
fn set_resets_ttl_for_any_key() {
    let store = Store::new(StoreOptions {
        ttl: Some(Duration::from_millis(40)),
        ..Default::default()
    });
    store.set("k", Value::from(1));
    std::thread::sleep(Duration::from_millis(25));
    store.set("k", Value::from(2)); // resets creation time
    std::thread::sleep(Duration::from_millis(25));
    // 25ms since the second Set, under the 40ms TTL; had the clock not been
    // reset this would be 50ms since the first Set and already expired.
    assert_eq!(store.get("k"), Some(Value::from(2)));
}
