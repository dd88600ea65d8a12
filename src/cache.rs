//! In-memory caches with lazy TTL expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::models::ROOT_ID;

/// Normalized logical path of the account root.
pub const ROOT_PATH: &str = "/";

struct CacheEntry<V> {
    value: V,
    written_at: Instant,
}

/// Time-bounded memoization guarded by a single lock.
///
/// Expired entries are dropped when a `get` finds them; there is no sweeper.
/// A `ttl` of `None` keeps entries until they are invalidated or cleared.
pub struct TtlCache<K, V> {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache whose entries never expire.
    pub fn unbounded() -> Self {
        Self {
            ttl: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        let expired = self
            .ttl
            .is_some_and(|ttl| entry.written_at.elapsed() > ttl);
        if expired {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: K, value: V) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.lock().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalized logical path → directory id.
///
/// The root always maps to [`ROOT_ID`], whatever the TTL or invalidations.
pub struct DirectoryPathCache {
    inner: TtlCache<String, u64>,
}

impl DirectoryPathCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Self {
            inner: TtlCache::new(ttl),
        };
        cache.seed_root();
        cache
    }

    fn seed_root(&self) {
        self.inner.set(ROOT_PATH.to_string(), ROOT_ID);
    }

    pub fn get(&self, path: &str) -> Option<u64> {
        if path == ROOT_PATH {
            return Some(ROOT_ID);
        }
        self.inner.get(path)
    }

    pub fn set(&self, path: &str, id: u64) {
        if path != ROOT_PATH {
            self.inner.set(path.to_string(), id);
        }
    }

    pub fn invalidate(&self, path: &str) {
        if path != ROOT_PATH {
            self.inner.invalidate(path);
        }
    }

    /// Empty the cache and re-seed the root.
    pub fn clear(&self) {
        self.inner.clear();
        self.seed_root();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
