//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the local store's invariants over generated
//! operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{Cache, LocalStore};
use crate::config::{CacheConfig, EvictionPolicy};

// == Test Configuration ==
const TEST_MAX_SIZE: usize = 100;

fn new_store(max_size: usize, policy: EvictionPolicy) -> LocalStore<String, String> {
    LocalStore::new(
        CacheConfig::builder("prop")
            .max_size(max_size)
            .eviction_policy(policy)
            .build()
            .unwrap(),
    )
    .unwrap()
}

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,128}"
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::Lru),
        Just(EvictionPolicy::Lfu),
        Just(EvictionPolicy::Fifo),
        Just(EvictionPolicy::TtlOnly),
        Just(EvictionPolicy::None),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    PutIfAbsent { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // A small key space so operations collide
    let key = "[a-e]";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::PutIfAbsent { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Remove { key }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // **Property: statistics conservation**
    // *For any* sequence of operations, hits + misses equals the number of
    // reads issued, and puts counts every stored write.
    #[test]
    fn prop_statistics_conservation(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let store = new_store(3, EvictionPolicy::Lru);
        let mut reads: u64 = 0;
        let mut expected_hits: u64 = 0;
        let mut expected_puts: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value, None).unwrap();
                    expected_puts += 1;
                }
                CacheOp::PutIfAbsent { key, value } => {
                    if store.put_if_absent(key, value, None).unwrap() {
                        expected_puts += 1;
                    }
                }
                CacheOp::Get { key } => {
                    reads += 1;
                    if store.get(&key).unwrap().is_some() {
                        expected_hits += 1;
                    }
                }
                CacheOp::Remove { key } => {
                    store.remove(&key).unwrap();
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits + stats.misses, reads, "Requests mismatch");
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.puts, expected_puts, "Puts mismatch");
    }

    // **Property: round-trip**
    // *For any* key and value, a put followed by a get returns the value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let store = new_store(TEST_MAX_SIZE, EvictionPolicy::Lru);

        store.put(key.clone(), value.clone(), None).unwrap();

        prop_assert_eq!(store.get(&key).unwrap(), Some(value), "Round-trip value mismatch");
    }

    // **Property: remove is final and idempotent**
    #[test]
    fn prop_remove_removes_entry(key in key_strategy(), value in value_strategy()) {
        let store = new_store(TEST_MAX_SIZE, EvictionPolicy::Lru);
        store.put(key.clone(), value, None).unwrap();

        prop_assert!(store.remove(&key).unwrap(), "First remove should report removal");
        prop_assert!(!store.remove(&key).unwrap(), "Second remove should be a no-op");
        prop_assert_eq!(store.get(&key).unwrap(), None);
        prop_assert_eq!(store.size().unwrap(), 0);
    }

    // **Property: overwrite semantics**
    // *For any* key, storing V1 then V2 leaves exactly one entry holding V2.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let store = new_store(TEST_MAX_SIZE, EvictionPolicy::Lru);

        store.put(key.clone(), value1, None).unwrap();
        store.put(key.clone(), value2.clone(), None).unwrap();

        prop_assert_eq!(
            store.get(&key).unwrap(),
            Some(value2),
            "Overwrite should return new value"
        );
        prop_assert_eq!(store.size().unwrap(), 1, "Should have exactly one entry after overwrite");
    }

    // **Property: capacity invariant**
    // *For any* policy and sequence of puts, size never exceeds max_size.
    #[test]
    fn prop_capacity_enforcement(
        policy in policy_strategy(),
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let max_size = 20;
        let store = new_store(max_size, policy);

        for (key, value) in entries {
            store.put(key, value, None).unwrap();
            let size = store.size().unwrap();
            prop_assert!(size <= max_size, "Cache size {} exceeds max {}", size, max_size);
        }
    }

    // **Property: LRU eviction order**
    // *For any* N distinct keys filling a cache of capacity N, one more
    // distinct put with no reads in between evicts the first-inserted key.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::vec(key_strategy(), 2..10),
        new_key in key_strategy(),
        new_value in value_strategy()
    ) {
        let unique_keys = unique(keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let store = new_store(capacity, EvictionPolicy::Lru);
        for key in &unique_keys {
            store.put(key.clone(), format!("value_{}", key), None).unwrap();
        }

        store.put(new_key.clone(), new_value, None).unwrap();

        prop_assert_eq!(store.size().unwrap(), capacity);
        prop_assert!(
            !store.exists(&unique_keys[0]).unwrap(),
            "Oldest key should have been evicted"
        );
        prop_assert!(store.exists(&new_key).unwrap());
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.exists(key).unwrap(), "Key '{}' should still exist", key);
        }
        prop_assert_eq!(store.stats().evictions, 1);
    }

    // **Property: LRU access tracking**
    // *For any* full cache, reading the oldest key protects it; the next
    // oldest is evicted instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(key_strategy(), 3..8),
        new_key in key_strategy(),
        new_value in value_strategy()
    ) {
        let unique_keys = unique(keys);
        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let store = new_store(unique_keys.len(), EvictionPolicy::Lru);
        for key in &unique_keys {
            store.put(key.clone(), format!("value_{}", key), None).unwrap();
        }

        let accessed_key = &unique_keys[0];
        prop_assert!(store.get(accessed_key).unwrap().is_some());

        store.put(new_key.clone(), new_value, None).unwrap();

        prop_assert!(store.exists(accessed_key).unwrap(), "Accessed key should not be evicted");
        prop_assert!(!store.exists(&unique_keys[1]).unwrap(), "Next oldest key should be evicted");
        prop_assert!(store.exists(&new_key).unwrap());
    }

    // **Property: clear is idempotent**
    #[test]
    fn prop_clear_idempotent(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 0..30)
    ) {
        let store = new_store(TEST_MAX_SIZE, EvictionPolicy::Lru);
        for (key, value) in entries {
            store.put(key, value, None).unwrap();
        }

        store.clear().unwrap();
        prop_assert_eq!(store.size().unwrap(), 0);
        store.clear().unwrap();
        prop_assert_eq!(store.size().unwrap(), 0);
        prop_assert!(store.keys().is_empty());
    }
}

// Fewer cases for the time-sensitive expiry properties
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // **Property: expiration**
    // *For any* entry stored with a TTL, a read after the TTL misses, and
    // an explicit sweep removes it without any read.
    #[test]
    fn prop_ttl_expiration_behavior(
        keys in prop::collection::vec(key_strategy(), 1..10),
        value in value_strategy()
    ) {
        let unique_keys = unique(keys);
        let store = new_store(TEST_MAX_SIZE, EvictionPolicy::Lru);
        let ttl = Duration::from_millis(30);

        for key in &unique_keys {
            store.put(key.clone(), value.clone(), Some(ttl)).unwrap();
        }
        prop_assert_eq!(store.get(&unique_keys[0]).unwrap(), Some(value));

        sleep(Duration::from_millis(60));

        prop_assert_eq!(store.evict_expired().unwrap(), unique_keys.len());
        prop_assert_eq!(store.size().unwrap(), 0);
        prop_assert_eq!(store.get(&unique_keys[0]).unwrap(), None);
        prop_assert_eq!(store.stats().expirations, unique_keys.len() as u64);
    }
}
