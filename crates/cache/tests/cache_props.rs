//! Property tests for frame cache accounting.
//!
//! Runs arbitrary op sequences against the cache and an independent
//! reference model of LRU-with-byte-budget semantics, then checks that
//! hit/miss counters, entry counts, and size accounting agree exactly.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use frameloom_cache::{FrameCache, FrameCacheConfig};

const BUDGET: u64 = 4096;

#[derive(Debug, Clone)]
enum Op {
    Set { key: u8, size: u64 },
    Get { key: u8 },
    Has { key: u8 },
    Delete { key: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        // sizes occasionally exceed the whole budget to exercise the
        // always-admit path
        (0u8..12, 1u64..6000).prop_map(|(key, size)| Op::Set { key, size }),
        (0u8..12).prop_map(|key| Op::Get { key }),
        (0u8..12).prop_map(|key| Op::Has { key }),
        (0u8..12).prop_map(|key| Op::Delete { key }),
    ]
}

/// Straight-line model of the cache: a map plus an explicit recency list
/// (index 0 = least recently used).
#[derive(Default)]
struct Model {
    sizes: HashMap<String, u64>,
    recency: Vec<String>,
    current: u64,
    hits: u64,
    misses: u64,
}

impl Model {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let k = self.recency.remove(pos);
            self.recency.push(k);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(size) = self.sizes.remove(key) {
            self.current -= size;
        }
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
    }

    fn set(&mut self, key: &str, size: u64) {
        self.remove(key);
        while self.current + size > BUDGET && !self.recency.is_empty() {
            let lru = self.recency.remove(0);
            let freed = self.sizes.remove(&lru).unwrap_or(0);
            self.current -= freed;
        }
        self.sizes.insert(key.to_string(), size);
        self.recency.push(key.to_string());
        self.current += size;
    }

    fn get(&mut self, key: &str) -> bool {
        if self.sizes.contains_key(key) {
            self.hits += 1;
            self.touch(key);
            true
        } else {
            self.misses += 1;
            false
        }
    }
}

fn key_name(key: u8) -> String {
    format!("frame-{key}")
}

proptest! {
    #[test]
    fn cache_accounting_matches_reference_model(
        ops in proptest::collection::vec(op_strategy(), 1..250)
    ) {
        let cache: FrameCache<Vec<u8>> = FrameCache::new(FrameCacheConfig {
            max_size_bytes: BUDGET,
            // effectively no expiry so the model stays time-free
            max_age: Duration::from_secs(3600),
        });
        let mut model = Model::default();
        let mut gets = 0u64;

        for op in &ops {
            match op {
                Op::Set { key, size } => {
                    let key = key_name(*key);
                    cache.set_with_size(&key, vec![0u8; 1], *size);
                    model.set(&key, *size);
                }
                Op::Get { key } => {
                    let key = key_name(*key);
                    gets += 1;
                    let expected = model.get(&key);
                    prop_assert_eq!(cache.get(&key).is_some(), expected);
                }
                Op::Has { key } => {
                    let key = key_name(*key);
                    // `has` never perturbs recency or counters
                    prop_assert_eq!(cache.has(&key), model.sizes.contains_key(&key));
                }
                Op::Delete { key } => {
                    let key = key_name(*key);
                    let existed = model.sizes.contains_key(&key);
                    prop_assert_eq!(cache.delete(&key), existed);
                    model.remove(&key);
                }
            }

            let stats = cache.stats();
            prop_assert_eq!(stats.hits, model.hits);
            prop_assert_eq!(stats.misses, model.misses);
            prop_assert_eq!(stats.hits + stats.misses, gets);
            prop_assert_eq!(stats.entries as usize, model.sizes.len());
            prop_assert_eq!(stats.size_bytes, model.current);
            prop_assert_eq!(cache.size(), model.current);
        }
    }

    #[test]
    fn size_never_exceeds_budget_when_entries_fit(
        ops in proptest::collection::vec((0u8..12, 1u64..BUDGET), 1..120)
    ) {
        let cache: FrameCache<Vec<u8>> = FrameCache::new(FrameCacheConfig {
            max_size_bytes: BUDGET,
            max_age: Duration::from_secs(3600),
        });

        for (key, size) in &ops {
            cache.set_with_size(key_name(*key), vec![0u8; 1], *size);
            prop_assert!(cache.size() <= BUDGET);
        }
    }

    #[test]
    fn writes_are_never_refused(
        ops in proptest::collection::vec((0u8..12, 1u64..20_000), 1..80)
    ) {
        let cache: FrameCache<Vec<u8>> = FrameCache::new(FrameCacheConfig {
            max_size_bytes: BUDGET,
            max_age: Duration::from_secs(3600),
        });

        for (key, size) in &ops {
            let key = key_name(*key);
            cache.set_with_size(&key, vec![0u8; 1], *size);
            prop_assert!(cache.has(&key));
        }
    }
}
