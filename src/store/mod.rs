//! Bounded, TTL'd, scoped key-value store shared between nodes in a graph.
//!
//! A [`Store`] wraps an [`lru::LruCache`] behind a single [`parking_lot::Mutex`]
//! for O(1)-average get/set/evict. TTL is layered on top: each entry records
//! when it was created, and `Get` lazily evicts anything past its deadline
//! before consulting the cache. `Set` on an existing key resets the entry's
//! creation time, restarting its TTL.
//!
//! Eviction callbacks (capacity or TTL) always run with the lock released —
//! a callback that turns around and calls back into the store (to log the
//! eviction, say) cannot deadlock against the eviction that triggered it.

mod reader;
mod scope;
mod writer;

pub use reader::StoreReader;
pub use scope::key_with_prefix;
pub use writer::StoreWriter;

use lru::LruCache;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PocketError;

/// A callback fired once per evicted entry, outside the store's lock.
pub type OnEvict = Arc<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Clone, Default)]
pub struct StoreOptions {
    pub max_entries: Option<NonZeroUsize>,
    pub ttl: Option<Duration>,
    pub on_evict: Option<OnEvict>,
}

struct Entry {
    value: Value,
    created_at: Instant,
}

const UNBOUNDED_CAPACITY: NonZeroUsize = NonZeroUsize::MAX;

pub(crate) struct StoreInner {
    cache: Mutex<LruCache<String, Entry>>,
    ttl: Option<Duration>,
    on_evict: Option<OnEvict>,
}

impl StoreInner {
    fn is_expired(&self, entry: &Entry) -> bool {
        match self.ttl {
            Some(ttl) => entry.created_at.elapsed() > ttl,
            None => false,
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        let mut evicted = None;
        let result = {
            let mut cache = self.cache.lock();
            match cache.get(key) {
                Some(entry) if self.is_expired(entry) => {
                    let value = entry.value.clone();
                    cache.pop(key);
                    evicted = Some((key.to_string(), value));
                    None
                }
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };
        if let Some((k, v)) = evicted {
            self.fire_evict(&k, &v);
        }
        result
    }

    fn set(&self, key: String, value: Value) {
        let mut displaced = Vec::new();
        {
            let mut cache = self.cache.lock();
            cache.pop(&key);
            if let Some((ek, ev)) = cache.push(key, Entry {
                value,
                created_at: Instant::now(),
            }) {
                displaced.push((ek, ev.value));
            }
        }
        for (k, v) in displaced {
            self.fire_evict(&k, &v);
        }
    }

    fn delete(&self, key: &str) -> Option<Value> {
        let mut cache = self.cache.lock();
        cache.pop(key).map(|e| e.value)
    }

    fn fire_evict(&self, key: &str, value: &Value) {
        if let Some(cb) = &self.on_evict {
            cb(key, value);
        }
    }
}

/// The root store. Cheaply cloneable; clones share the same underlying data,
/// LRU policy, and TTL policy (see [`Store::scope`] for prefix views).
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(options: StoreOptions) -> Self {
        let capacity = options.max_entries.unwrap_or(UNBOUNDED_CAPACITY);
        Store {
            inner: Arc::new(StoreInner {
                cache: Mutex::new(LruCache::new(capacity)),
                ttl: options.ttl,
                on_evict: options.on_evict,
            }),
        }
    }

    pub fn unbounded() -> Self {
        Store::new(StoreOptions::default())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PocketError> {
        match self.get(key) {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.set(key.into(), value);
    }

    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> Result<(), PocketError> {
        self.set(key, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        self.inner.delete(key)
    }

    pub fn len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A read-only prefix view sharing this store's data, LRU policy, and
    /// TTL policy. Nesting scopes concatenates prefixes (`scope("a").
    /// reader_scope("b")` reads/writes under `"a:b:"`).
    pub fn reader(&self) -> StoreReader<'_> {
        StoreReader::new(self.inner.clone(), String::new())
    }

    pub fn writer(&self) -> StoreWriter<'_> {
        StoreWriter::new(self.inner.clone(), String::new())
    }

}

/// A typed facade over a [`Store`], for callers that want to pass around a
/// handle pinned to a single value type instead of raw `serde_json::Value`.
pub struct TypedStore<T> {
    store: Store,
    key: String,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> TypedStore<T> {
    pub fn new(store: Store, key: impl Into<String>) -> Self {
        TypedStore {
            store,
            key: key.into(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn get(&self) -> Result<Option<T>, PocketError> {
        self.store.get_as(&self.key)
    }

    pub fn set(&self, value: &T) -> Result<(), PocketError> {
        self.store.set_as(&self.key, value)
    }
}
