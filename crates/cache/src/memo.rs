//! Dependency-keyed memoization for derived values.

use std::collections::HashMap;
use std::sync::Mutex;

struct MemoEntry<V, D> {
    value: V,
    deps: Vec<D>,
}

/// Memoizes expensive derivations against a dependency list, the way a
/// render layer caches parsed assets or layout solutions between frames.
///
/// An explicit instance passed around by handle (`Arc<MemoCache<..>>`);
/// there is deliberately no process-wide singleton. Storage is unbounded:
/// callers own key hygiene, and a key built from unstable input (say, a
/// timestamp) will grow the map without ever hitting.
///
/// Two callers racing on the same key may both run `compute`; the last
/// insert wins. The compute closure runs outside the lock, so re-entrant
/// lookups from inside it do not deadlock.
pub struct MemoCache<V, D = u64> {
    entries: Mutex<HashMap<String, MemoEntry<V, D>>>,
}

impl<V: Clone, D: PartialEq + Clone> MemoCache<V, D> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value when the dependency list is unchanged
    /// (same length, every element equal in order); otherwise run
    /// `compute`, store its result with the new dependencies, and return
    /// it. `compute` is never called speculatively.
    pub fn get_or_compute(&self, key: &str, deps: &[D], compute: impl FnOnce() -> V) -> V {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(key) {
                if entry.deps.as_slice() == deps {
                    return entry.value.clone();
                }
            }
        }

        let value = compute();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            MemoEntry {
                value: value.clone(),
                deps: deps.to_vec(),
            },
        );
        value
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized value.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl<V: Clone, D: PartialEq + Clone> Default for MemoCache<V, D> {
    fn default() -> Self {
        Self::new()
    }
}
