//! Three-tier cache manager.
//!
//! # Read path
//! ```text
//! fast map (fresh?) → per-category LRU (fresh?) → persistent store (fresh?)
//!     → miss (or fallback producer)
//! ```
//!
//! A write goes to all three tiers. Persistent-tier failures are logged and
//! counted, never returned: the cache is an optimization, not a source of truth.

use dashmap::DashMap;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::cache::category::CacheCategory;
use crate::cache::clock::{Clock, SystemClock};
use crate::cache::item::{CacheItem, Freshness};
use crate::cache::store::{
    category_prefix, storage_key, JsonFileStore, MemoryStore, PersistentStore, StoreError,
    STORAGE_PREFIX,
};
use crate::config::CacheConfig;
use crate::observability::metrics;

type Slot = (CacheCategory, String);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("value cannot be cached: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-category counters reported by [`CacheManager::stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: CacheCategory,
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0 when nothing was read yet.
    pub hit_ratio: f64,
}

/// One entry for [`CacheManager::warmup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupEntry {
    pub key: String,
    pub data: Value,
    pub category: CacheCategory,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Keyed, categorized cache with memory and persistent tiers.
///
/// Construct once at startup and share through an `Arc`.
pub struct CacheManager {
    fast: DashMap<Slot, CacheItem<Value>>,
    lru: Vec<Mutex<LruCache<String, CacheItem<Value>>>>,
    counters: Vec<Counters>,
    store: Option<Arc<dyn PersistentStore>>,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    pub fn new(store: Option<Arc<dyn PersistentStore>>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Option<Arc<dyn PersistentStore>>, clock: Arc<dyn Clock>) -> Self {
        let lru = CacheCategory::ALL
            .iter()
            .map(|c| {
                let cap = NonZeroUsize::new(c.policy().max_items).unwrap_or(NonZeroUsize::MIN);
                Mutex::new(LruCache::new(cap))
            })
            .collect();
        let counters = CacheCategory::ALL.iter().map(|_| Counters::default()).collect();

        Self {
            fast: DashMap::new(),
            lru,
            counters,
            store,
            clock,
        }
    }

    /// Build the manager with the persistent tier described by `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self, StoreError> {
        let store: Option<Arc<dyn PersistentStore>> = match (config.persistent, &config.path) {
            (false, _) => None,
            (true, Some(path)) => Some(Arc::new(JsonFileStore::open(path)?)),
            (true, None) => Some(Arc::new(MemoryStore::new())),
        };
        Ok(Self::new(store))
    }

    fn lru(&self, category: CacheCategory) -> MutexGuard<'_, LruCache<String, CacheItem<Value>>> {
        self.lru[category.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record_hit(&self, category: CacheCategory, tier: &'static str) {
        self.counters[category.index()].hits.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_hit(category.as_str(), tier);
    }

    fn record_miss(&self, category: CacheCategory) {
        self.counters[category.index()].misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_miss(category.as_str());
    }

    /// Store `data` under `key` in every tier. `ttl` overrides the category default.
    pub async fn set<T>(
        &self,
        key: &str,
        data: &T,
        category: CacheCategory,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(data)?;
        let ttl = ttl.unwrap_or(category.policy().ttl);
        let item = CacheItem {
            data: value,
            timestamp: self.clock.now_ms(),
            ttl: ttl.as_millis() as u64,
            key: key.to_string(),
            category,
        };

        self.insert_memory(item.clone());
        self.persist(&item).await;
        Ok(())
    }

    fn insert_memory(&self, item: CacheItem<Value>) {
        let category = item.category;
        let displaced = self.lru(category).push(item.key.clone(), item.clone());

        if let Some((evicted, _)) = displaced {
            if evicted != item.key {
                self.fast.remove(&(category, evicted.clone()));
                metrics::record_cache_eviction(category.as_str());
                tracing::debug!(category = %category, key = %evicted, "Evicted least recently used entry");
            }
        }

        self.fast.insert((category, item.key.clone()), item);
    }

    async fn persist(&self, item: &CacheItem<Value>) {
        let Some(store) = &self.store else {
            return;
        };
        let encoded = match serde_json::to_string(item) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key = %item.key, error = %e, "Failed to encode cache item");
                metrics::record_persist_failure("write");
                return;
            }
        };
        if let Err(e) = store.set(&storage_key(item.category, &item.key), encoded).await {
            tracing::warn!(
                category = %item.category,
                key = %item.key,
                error = %e,
                "Failed to persist cache item"
            );
            metrics::record_persist_failure("write");
        }
    }

    /// Fresh item for `key`, consulting the tiers in order.
    async fn lookup(&self, key: &str, category: CacheCategory) -> Option<CacheItem<Value>> {
        let now = self.clock.now_ms();
        let slot = (category, key.to_string());

        let cached = self.fast.get(&slot).map(|r| r.value().clone());
        if let Some(item) = cached {
            if item.is_fresh(now) {
                self.lru(category).promote(key);
                self.record_hit(category, "memory");
                return Some(item);
            }
            self.fast.remove(&slot);
        }

        let from_lru = self.lru(category).get(key).cloned();
        if let Some(item) = from_lru {
            if item.is_fresh(now) {
                self.fast.insert(slot, item.clone());
                self.record_hit(category, "lru");
                return Some(item);
            }
        }

        let persisted = self.read_persisted(key, category, now).await;
        if let Some(item) = persisted {
            self.insert_memory(item.clone());
            self.record_hit(category, "persistent");
            return Some(item);
        }

        None
    }

    async fn read_persisted(
        &self,
        key: &str,
        category: CacheCategory,
        now: u64,
    ) -> Option<CacheItem<Value>> {
        let store = self.store.as_ref()?;
        let storage_key = storage_key(category, key);

        let raw = match store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Failed to read persisted cache item");
                metrics::record_persist_failure("read");
                return None;
            }
        };

        match serde_json::from_str::<CacheItem<Value>>(&raw) {
            Ok(item) if item.category == category && item.key == key && item.is_fresh(now) => {
                Some(item)
            }
            Ok(_) => {
                tracing::debug!(key = %storage_key, "Dropping expired persisted item");
                self.discard(store.as_ref(), &storage_key).await;
                None
            }
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Dropping malformed persisted item");
                self.discard(store.as_ref(), &storage_key).await;
                None
            }
        }
    }

    async fn discard(&self, store: &dyn PersistentStore, storage_key: &str) {
        if let Err(e) = store.remove(storage_key).await {
            tracing::warn!(key = %storage_key, error = %e, "Failed to remove persisted item");
            metrics::record_persist_failure("remove");
        }
    }

    fn decode<T: DeserializeOwned>(item: CacheItem<Value>) -> Option<T> {
        match serde_json::from_value(item.data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    category = %item.category,
                    key = %item.key,
                    error = %e,
                    "Cached value has an unexpected shape"
                );
                None
            }
        }
    }

    /// Fresh value for `key`, or `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, category: CacheCategory) -> Option<T> {
        let value = match self.lookup(key, category).await {
            Some(item) => Self::decode(item),
            None => None,
        };
        if value.is_none() {
            self.record_miss(category);
        }
        value
    }

    /// Fresh value for `key`, or run `fallback`, store its result and return it.
    ///
    /// An error from `fallback` is returned as is and nothing is stored.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        category: CacheCategory,
        fallback: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key, category).await {
            return Ok(value);
        }

        let data = fallback().await?;
        if let Err(e) = self.set(key, &data, category, None).await {
            tracing::warn!(category = %category, key = key, error = %e, "Failed to cache fetched value");
        }
        Ok(data)
    }

    /// Stale-while-revalidate read.
    ///
    /// A fresh value is returned at once; when it is past the category's
    /// stale window a refresh is spawned. A stale-but-usable value is returned
    /// with a refresh spawned. Otherwise `fetch` runs inline.
    pub async fn get_or_revalidate<T, E, F, Fut>(
        self: &Arc<Self>,
        key: &str,
        category: CacheCategory,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        E: fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let stale_window = category.policy().stale_window.as_millis() as u64;

        if let Some(item) = self.lookup(key, category).await {
            let needs_refresh = item.age(self.clock.now_ms()) > stale_window;
            if let Some(value) = Self::decode(item) {
                if needs_refresh {
                    self.spawn_refresh(key, category, fetch);
                }
                return Ok(value);
            }
        } else {
            let stale = self.lru(category).peek(key).cloned();
            if let Some(item) = stale.filter(|item| self.freshness(item) == Freshness::StaleUsable) {
                if let Some(value) = Self::decode(item) {
                    self.record_hit(category, "stale");
                    self.spawn_refresh(key, category, fetch);
                    return Ok(value);
                }
            }
        }

        self.record_miss(category);
        let data = fetch().await?;
        if let Err(e) = self.set(key, &data, category, None).await {
            tracing::warn!(category = %category, key = key, error = %e, "Failed to cache fetched value");
        }
        Ok(data)
    }

    fn spawn_refresh<T, E, F, Fut>(self: &Arc<Self>, key: &str, category: CacheCategory, fetch: F)
    where
        T: Serialize + Send + Sync + 'static,
        E: fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let this = Arc::clone(self);
        let key = key.to_string();
        tracing::debug!(category = %category, key = %key, "Revalidating in background");

        tokio::spawn(async move {
            match fetch().await {
                Ok(data) => {
                    if let Err(e) = this.set(&key, &data, category, None).await {
                        tracing::warn!(category = %category, key = %key, error = %e, "Failed to cache refreshed value");
                    }
                }
                Err(e) => {
                    tracing::warn!(category = %category, key = %key, error = %e, "Background refresh failed");
                }
            }
        });
    }

    /// True when the entry is older than the category's stale window, or absent.
    pub fn is_stale(&self, key: &str, category: CacheCategory) -> bool {
        let stale_window = category.policy().stale_window.as_millis() as u64;
        let now = self.clock.now_ms();
        match self.lru(category).peek(key) {
            Some(item) => item.age(now) > stale_window,
            None => true,
        }
    }

    pub fn freshness<T>(&self, item: &CacheItem<T>) -> Freshness {
        item.freshness(self.clock.now_ms(), item.category.policy().stale_window)
    }

    /// Remove `key` from every tier.
    pub async fn invalidate(&self, key: &str, category: CacheCategory) {
        self.lru(category).pop(key);
        self.fast.remove(&(category, key.to_string()));

        if let Some(store) = &self.store {
            self.discard(store.as_ref(), &storage_key(category, key)).await;
        }
    }

    /// Remove every entry of `category` from every tier.
    pub async fn invalidate_type(&self, category: CacheCategory) {
        self.lru(category).clear();
        self.fast.retain(|(c, _), _| *c != category);
        self.remove_persisted(&category_prefix(category)).await;
        tracing::info!(category = %category, "Cache category invalidated");
    }

    /// Remove everything from every tier.
    pub async fn clear(&self) {
        for category in CacheCategory::ALL {
            self.lru(category).clear();
        }
        self.fast.clear();
        self.remove_persisted(STORAGE_PREFIX).await;
        tracing::info!("Cache cleared");
    }

    async fn remove_persisted(&self, prefix: &str) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.remove_prefix(prefix).await {
            tracing::warn!(prefix = prefix, error = %e, "Failed to clear persisted items");
            metrics::record_persist_failure("remove");
        }
    }

    pub fn stats(&self) -> Vec<CategoryStats> {
        CacheCategory::ALL
            .iter()
            .map(|&category| {
                let counters = &self.counters[category.index()];
                let hits = counters.hits.load(Ordering::Relaxed);
                let misses = counters.misses.load(Ordering::Relaxed);
                let total = hits + misses;
                CategoryStats {
                    category,
                    size: self.lru(category).len(),
                    max_size: category.policy().max_items,
                    hits,
                    misses,
                    hit_ratio: if total == 0 {
                        0.0
                    } else {
                        hits as f64 / total as f64
                    },
                }
            })
            .collect()
    }

    /// Bulk insert. Failing entries are logged and skipped; returns how many were stored.
    pub async fn warmup(&self, entries: Vec<WarmupEntry>) -> usize {
        let total = entries.len();
        let mut stored = 0;
        for entry in entries {
            match self.set(&entry.key, &entry.data, entry.category, None).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    tracing::warn!(category = %entry.category, key = %entry.key, error = %e, "Warmup entry skipped");
                }
            }
        }
        tracing::info!(stored = stored, total = total, "Cache warmed up");
        stored
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("fast_entries", &self.fast.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
