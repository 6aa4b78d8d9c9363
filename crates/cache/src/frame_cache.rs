//! Bounded frame cache with LRU eviction and per-entry TTL.
//!
//! Frames are keyed by composition, frame index, and geometry. The cache
//! owns its payloads until eviction; callers get clones (payloads are
//! expected to be cheaply clonable, e.g. `Arc`-backed buffers). All state
//! lives behind a single mutex so size accounting and hit/miss counters
//! can never drift from the entry list.

use lru::LruCache;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use frameloom_common::CacheDefaults;

/// Types that can report their cached payload size.
pub trait ByteSized {
    fn size_bytes(&self) -> u64;
}

impl ByteSized for Vec<u8> {
    fn size_bytes(&self) -> u64 {
        self.len() as u64
    }
}

impl<T: ByteSized> ByteSized for std::sync::Arc<T> {
    fn size_bytes(&self) -> u64 {
        (**self).size_bytes()
    }
}

/// Sizing and lifetime bounds for a [`FrameCache`].
#[derive(Debug, Clone)]
pub struct FrameCacheConfig {
    /// Maximum cumulative payload size in bytes.
    pub max_size_bytes: u64,

    /// Entry lifetime measured from insertion. Access does not refresh it.
    pub max_age: Duration,
}

impl Default for FrameCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            max_age: Duration::from_secs(5 * 60),
        }
    }
}

impl From<&CacheDefaults> for FrameCacheConfig {
    fn from(defaults: &CacheDefaults) -> Self {
        Self {
            max_size_bytes: defaults.max_size_bytes,
            max_age: Duration::from_millis(defaults.max_age_ms),
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size_bytes: u64,
    pub entries: u64,
    /// hits / (hits + misses), 0.0 before any access.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct Entry<T> {
    payload: T,
    size_bytes: u64,
    created_at: Instant,
}

#[derive(Debug)]
struct Inner<T> {
    /// Recency list; promotion happens on `get`, never on `has`.
    entries: LruCache<String, Entry<T>>,
    current_bytes: u64,
    hits: u64,
    misses: u64,
}

/// Byte-accounted LRU + TTL cache for rendered frames.
///
/// Eviction runs on insertion: least-recently-used entries are dropped
/// until the incoming entry fits. A single entry larger than the whole
/// budget is still admitted after evicting everything else; writes are
/// never refused. Expired entries surface as misses and are evicted on
/// the access that discovers them.
pub struct FrameCache<T> {
    inner: Mutex<Inner<T>>,
    config: FrameCacheConfig,
}

impl<T: ByteSized + Clone> FrameCache<T> {
    pub fn new(config: FrameCacheConfig) -> Self {
        debug!(
            "FrameCache created: max_size={} bytes, max_age={:?}",
            config.max_size_bytes, config.max_age
        );
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                current_bytes: 0,
                hits: 0,
                misses: 0,
            }),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FrameCacheConfig::default())
    }

    /// Fetch a payload. Counts a hit or a miss, promotes on hit, and
    /// evicts the entry when its TTL has lapsed (counted as a miss).
    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner
            .entries
            .peek(key)
            .map(|e| e.created_at.elapsed() > self.config.max_age)
        {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(expired) => expired,
        };
        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.current_bytes = inner.current_bytes.saturating_sub(entry.size_bytes);
                debug!("Expired cache entry evicted on get: {}", key);
            }
            inner.misses += 1;
            return None;
        }
        inner.hits += 1;
        inner.entries.get(key).map(|e| e.payload.clone())
    }

    /// Insert a payload, deriving its size from [`ByteSized`].
    pub fn set(&self, key: impl Into<String>, payload: T) {
        let size = payload.size_bytes();
        self.set_with_size(key, payload, size);
    }

    /// Insert a payload with an explicit size (bytes). Replacing an
    /// existing key retires the old entry's size before the new one is
    /// accounted, so concurrent re-sets never double-count.
    pub fn set_with_size(&self, key: impl Into<String>, payload: T, size_bytes: u64) {
        let key = key.into();
        let mut inner = self.inner.lock().unwrap();

        if let Some(old) = inner.entries.pop(&key) {
            inner.current_bytes = inner.current_bytes.saturating_sub(old.size_bytes);
        }

        while inner.current_bytes + size_bytes > self.config.max_size_bytes {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.current_bytes =
                        inner.current_bytes.saturating_sub(evicted.size_bytes);
                    debug!(
                        "LRU evicted cache entry: {} ({} bytes freed)",
                        evicted_key, evicted.size_bytes
                    );
                }
                None => break,
            }
        }

        inner.current_bytes += size_bytes;
        inner.entries.push(
            key,
            Entry {
                payload,
                size_bytes,
                created_at: Instant::now(),
            },
        );
    }

    /// Whether a live entry exists for the key. Does not promote and does
    /// not touch hit/miss counters; expired entries are evicted and
    /// reported absent.
    pub fn has(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner
            .entries
            .peek(key)
            .map(|e| e.created_at.elapsed() > self.config.max_age)
        {
            None => return false,
            Some(expired) => expired,
        };
        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.current_bytes = inner.current_bytes.saturating_sub(entry.size_bytes);
            }
            return false;
        }
        true
    }

    /// Remove an entry. Returns whether one existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.pop(key) {
            Some(entry) => {
                inner.current_bytes = inner.current_bytes.saturating_sub(entry.size_bytes);
                true
            }
            None => false,
        }
    }

    /// Drop every entry. Hit/miss counters are cumulative and survive.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.current_bytes = 0;
        debug!("Frame cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            size_bytes: inner.current_bytes,
            entries: inner.entries.len() as u64,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
        }
    }

    /// Current cumulative payload size in bytes.
    pub fn size(&self) -> u64 {
        self.inner.lock().unwrap().current_bytes
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &FrameCacheConfig {
        &self.config
    }
}

/// Deterministic cache key for a rendered frame. Identical inputs always
/// produce the identical key; geometry is part of the key so a resize
/// never aliases stale frames.
pub fn frame_cache_key(
    composition_id: &str,
    frame_index: u32,
    width: u32,
    height: u32,
) -> String {
    format!("{composition_id}:{frame_index}:{width}x{height}")
}
