//! Key/value cache for generated documents.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::debug;

/// A string cache keyed by name.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Remove one entry; returns whether it existed.
    fn remove(&self, key: &str) -> bool;

    /// Drop every entry.
    fn flush(&self);

    /// Return the cached value or compute, store and return it.
    ///
    /// A `None` from `compute` stores nothing. The default is a plain get then
    /// set, where concurrent misses may both compute; stores that can hold a
    /// lock across the computation override it.
    fn get_or_set_with(
        &self,
        key: &str,
        compute: &mut dyn FnMut() -> Option<String>,
    ) -> Option<String> {
        if let Some(hit) = self.get(key) {
            return Some(hit);
        }
        let value = compute()?;
        self.set(key, value.clone());
        Some(value)
    }
}

/// Fallible get-or-set on any store. Errors are returned and nothing is cached.
pub fn get_or_try_set<E, F>(store: &dyn CacheStore, key: &str, compute: F) -> Result<String, E>
where
    F: FnOnce() -> Result<String, E>,
{
    let mut compute = Some(compute);
    let mut failure = None;

    let value = store.get_or_set_with(key, &mut || {
        let compute = compute.take()?;
        match compute() {
            Ok(value) => Some(value),
            Err(e) => {
                failure = Some(e);
                None
            }
        }
    });

    match (value, failure) {
        (_, Some(e)) => Err(e),
        (Some(value), None) => Ok(value),
        // The closure only declines after its single call.
        (None, None) => Ok(String::new()),
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    stored_at: Instant,
}

/// In-process cache guarded by a mutex.
///
/// [`CacheStore::get_or_set_with`] holds the lock while computing, so each
/// key is built at most once even under concurrent misses.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// A cache whose entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::default(),
            ttl: Some(ttl),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh<'a>(&self, entries: &'a HashMap<String, Entry>, key: &str) -> Option<&'a str> {
        let entry = entries.get(key)?;
        match self.ttl {
            Some(ttl) if entry.stored_at.elapsed() >= ttl => None,
            _ => Some(&entry.value),
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.lock();
        self.fresh(&entries, key).map(str::to_string)
    }

    fn set(&self, key: &str, value: String) {
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    fn flush(&self) {
        self.lock().clear();
    }

    fn get_or_set_with(
        &self,
        key: &str,
        compute: &mut dyn FnMut() -> Option<String>,
    ) -> Option<String> {
        let mut entries = self.lock();
        if let Some(hit) = self.fresh(&entries, key) {
            debug!(key, "cache hit");
            return Some(hit.to_string());
        }

        debug!(key, "cache miss");
        let value = compute()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Some(value)
    }
}
