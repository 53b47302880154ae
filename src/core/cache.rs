//! Bounded least-recently-used response cache.
//!
//! Entries never expire by age; they leave only when capacity pressure evicts
//! the least recently touched key.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

/// Default number of entries kept by provider caches.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Query parameters that carry credentials and must not split cache keys.
const VOLATILE_PARAMS: &[&str] = &["apiKey", "crumb"];

/// Defines the behavior of the in-memory cache for an API call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from the cache if an entry is present; otherwise, fetch from the network
    /// and write the response to the cache. (Default)
    #[default]
    Use,
    /// Always fetch from the network, bypassing any cached entry, and write the new response to the cache.
    Refresh,
    /// Always fetch from the network and do not read from or write to the cache.
    Bypass,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    tick: u64,
}

#[derive(Debug)]
struct Lru<K, V> {
    entries: HashMap<K, Slot<V>>,
    // recency order: smallest tick is the least recently used key
    order: BTreeMap<u64, K>,
    next_tick: u64,
}

impl<K: Eq + Hash + Clone, V> Lru<K, V> {
    fn touch(&mut self, key: &K) -> Option<&mut Slot<V>> {
        let tick = self.next_tick;
        let slot = self.entries.get_mut(key)?;
        self.order.remove(&slot.tick);
        slot.tick = tick;
        self.order.insert(tick, key.clone());
        self.next_tick += 1;
        Some(slot)
    }

    fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// A thread-safe, fixed-capacity LRU map.
///
/// `get` counts as an access and refreshes the entry's recency; `put` inserts
/// or replaces and then evicts the least recently used entry while the cache
/// is over capacity.
#[derive(Debug)]
pub struct ResponseCache<K = String, V = String> {
    inner: Mutex<Lru<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> ResponseCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Lru {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_tick: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Returns a clone of the cached value and marks it as most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut lru = self.lock();
        lru.touch(key).map(|slot| slot.value.clone())
    }

    /// Inserts or replaces `key`, evicting the least recently used entry if the cache overflows.
    pub fn put(&self, key: K, value: V) {
        let mut lru = self.lock();
        if let Some(slot) = lru.touch(&key) {
            slot.value = value;
            return;
        }

        let tick = lru.next_tick;
        lru.next_tick += 1;
        lru.order.insert(tick, key.clone());
        lru.entries.insert(key, Slot { value, tick });

        while lru.entries.len() > self.capacity {
            if lru.evict_oldest().is_none() {
                break;
            }
        }
    }

    /// Whether `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut lru = self.lock();
        lru.entries.clear();
        lru.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Lru<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Canonical request signature: endpoint plus query parameters sorted by name and value.
///
/// Credential parameters (`apiKey`, `crumb`) are left out so a refreshed
/// session does not orphan earlier entries.
#[must_use]
pub fn cache_key(url: &Url) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !VOLATILE_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.set_fragment(None);

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{endpoint}?{query}")
}
