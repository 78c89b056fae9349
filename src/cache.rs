//! In-memory response cache with LRU eviction and TTL expiry.
//!
//! The HTTP layer owns one [`Cache`] per client and shares it across clones via
//! `Arc`. Recency is tracked by an [`lru::LruCache`] behind a single `Mutex`, so
//! concurrent `get`/`set` calls from many tasks can never tear the access order or
//! exceed the size bound. Expiry is lazy: stale entries are dropped when a lookup
//! finds them.

use lru::LruCache;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// A stored value together with its timestamps.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    stored_at: Instant,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: LruCache<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<V> CacheState<V> {
    /// Live-entry check that leaves recency untouched. Drops the entry if it expired.
    fn peek_live(&mut self, key: &str, now: Instant) -> Option<bool> {
        let expired = self.entries.peek(key)?.is_expired(now);
        if expired {
            self.entries.pop(key);
        }
        Some(!expired)
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
        }
    }
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0.0 before the first lookup.
    pub hit_rate: f64,
}

/// Bounded key-value store with least-recently-used eviction and per-entry TTL.
#[derive(Debug)]
pub struct Cache<V> {
    state: Mutex<CacheState<V>>,
    max_size: usize,
    default_ttl: Duration,
}

impl<V: Clone> Cache<V> {
    /// Creates an empty cache holding at most `max_size` entries.
    ///
    /// A zero `default_ttl` means entries never expire unless `set` is given
    /// an explicit TTL. A zero `max_size` stores nothing.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            max_size,
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a clone of the stored value if present and not expired.
    ///
    /// A hit promotes the key to most recently used. An expired entry is removed
    /// and counted as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.lock();
        match state.peek_live(key, Instant::now()) {
            Some(true) => {
                state.hits += 1;
                state.entries.get(key).map(|entry| entry.data.clone())
            }
            Some(false) => {
                state.misses += 1;
                debug!(key, "cache entry expired");
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous value and restarting its TTL.
    ///
    /// `ttl` overrides the cache default; `Some(Duration::ZERO)` stores an entry
    /// that never expires. When the cache is full and `key` is new, expired
    /// entries are dropped first and then the least recently used live entry is evicted.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        if self.max_size == 0 {
            return;
        }

        let key = key.into();
        let mut state = self.lock();
        let now = Instant::now();

        if !state.entries.contains(&key) && state.entries.len() >= self.max_size {
            state.purge_expired(now);
            if state.entries.len() >= self.max_size {
                if let Some((evicted, _)) = state.entries.pop_lru() {
                    debug!(key = %evicted, "evicted least recently used cache entry");
                }
            }
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = if ttl.is_zero() {
            None
        } else {
            now.checked_add(ttl)
        };
        state.entries.put(
            key,
            CacheEntry {
                data: value,
                stored_at: now,
                expires_at,
            },
        );
    }

    /// Whether a live entry exists for `key`. Expired entries are removed.
    /// Does not change the hit/miss counters or the access order.
    pub fn has(&self, key: &str) -> bool {
        self.lock().peek_live(key, Instant::now()).unwrap_or(false)
    }

    /// Age of a live entry.
    pub fn age(&self, key: &str) -> Option<Duration> {
        let state = self.lock();
        let now = Instant::now();
        state
            .entries
            .peek(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| now.duration_since(entry.stored_at))
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    /// Drops every entry and the access history. Counters are kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        CacheStats {
            size: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }
}

/// Builds a fixed-length cache key from a composite lookup.
///
/// Objects are serialized with their keys sorted, so two values that differ
/// only in field insertion order produce the same key. The result is the
/// SHA-256 of that canonical form, hex encoded.
pub fn cache_key(parts: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(parts, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
