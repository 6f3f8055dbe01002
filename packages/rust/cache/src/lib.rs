//! In-memory TTL cache shared by every pipeline component.
//!
//! Keys are namespaced by logical purpose (`search:`, `page:`, `tree:`) so
//! pattern-based invalidation can target one class without clearing others.
//! Capacity is bounded; on overflow the least-recently-accessed 10% of
//! entries (at least one) are evicted — writes never block or error.
//!
//! The cache is internally synchronized: one instance is constructed at
//! process start and shared via `Arc` across concurrent pipeline runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::debug;

use pathweaver_shared::CacheConfig;

// ---------------------------------------------------------------------------
// Key construction
// ---------------------------------------------------------------------------

/// Cache key for one provider search call.
pub fn search_key(query: &str, max_results: usize, language: &str) -> String {
    format!("search:{query}_{max_results}_{language}")
}

/// Cache key for one fetched page, normalized to dedupe fragment/slash
/// variants of the same URL.
pub fn page_key(url: &str) -> String {
    let url = url.split('#').next().unwrap_or(url);
    let url = url.strip_suffix('/').unwrap_or(url);
    format!("page:{url}")
}

/// Cache key for an assembled tree. The parameter set is hashed so the key
/// stays bounded regardless of topic length.
pub fn tree_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    format!("tree:{:x}", digest)
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
    last_access: Instant,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    hits: u64,
    misses: u64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits / (hits + misses); 0.0 before any lookup.
    pub hit_rate: f64,
}

/// Bounded in-memory key/value store with per-entry TTL and LRU eviction.
pub struct Cache {
    state: Mutex<State>,
    config: CacheConfig,
}

impl Cache {
    /// Create an empty cache with the given capacity and TTL classes.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(State::default()),
            config,
        }
    }

    /// TTL for `search:` entries.
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.config.search_ttl_secs)
    }

    /// TTL for `page:` entries.
    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.config.page_ttl_secs)
    }

    /// TTL for `tree:` entries.
    pub fn tree_ttl(&self) -> Duration {
        Duration::from_secs(self.config.tree_ttl_secs)
    }

    /// Look up a key. Expired entries are removed lazily; a hit refreshes
    /// the entry's access recency.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at <= now,
        };

        if expired {
            state.entries.remove(key);
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        let entry = state.entries.get_mut(key).expect("entry checked above");
        entry.last_access = now;
        Some(entry.value.clone())
    }

    /// Look up and deserialize a typed value. Entries that fail to
    /// deserialize count as misses.
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).ok()
    }

    /// Store a value under `key` with the given TTL. Never fails: capacity
    /// overflow evicts the least-recently-accessed 10% (at least one entry).
    pub fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        if state.entries.len() >= self.config.max_entries && !state.entries.contains_key(key) {
            Self::evict_lru(&mut state, self.config.max_entries);
        }

        state.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
                last_access: now,
            },
        );
    }

    /// Serialize and store a typed value. Serialization failures are logged
    /// and the write dropped, matching the never-error write contract.
    pub fn set_typed<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json, ttl),
            Err(e) => debug!(key, error = %e, "cache write skipped, value not serializable"),
        }
    }

    /// Remove all entries whose key matches a `*`-glob pattern.
    /// Returns the number of entries removed.
    pub fn delete_pattern(&self, pattern: &str) -> usize {
        let mut state = self.state.lock().expect("cache mutex poisoned");

        if pattern == "*" {
            let count = state.entries.len();
            state.entries.clear();
            return count;
        }

        let Some(re) = glob_to_regex(pattern) else {
            return 0;
        };

        let keys: Vec<String> = state
            .entries
            .keys()
            .filter(|k| re.is_match(k))
            .cloned()
            .collect();

        for key in &keys {
            state.entries.remove(key);
        }

        debug!(pattern, removed = keys.len(), "cache pattern delete");
        keys.len()
    }

    /// Current size and hit-rate statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().expect("cache mutex poisoned");
        let lookups = state.hits + state.misses;
        CacheStats {
            size: state.entries.len(),
            max_size: self.config.max_entries,
            hits: state.hits,
            misses: state.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }

    /// Evict the least-recently-accessed 10% of capacity, at least one entry.
    fn evict_lru(state: &mut State, max_entries: usize) {
        let evict_count = (max_entries / 10).max(1);

        let mut by_access: Vec<(String, Instant)> = state
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.last_access))
            .collect();
        by_access.sort_by_key(|(_, t)| *t);

        for (key, _) in by_access.into_iter().take(evict_count) {
            state.entries.remove(&key);
        }

        debug!(evicted = evict_count, "cache capacity eviction");
    }
}

/// Convert a `*`-glob pattern to an anchored regex.
fn glob_to_regex(pattern: &str) -> Option<regex::Regex> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    regex::Regex::new(&format!("^{escaped}$")).ok()
}
