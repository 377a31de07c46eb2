//! Persistent tier backends.
//!
//! Keys are `cache_<category>_<key>`, values are JSON-encoded `CacheItem`s.
//! Backends store opaque strings; decoding and freshness belong to the manager.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::cache::category::CacheCategory;
use crate::observability::metrics;

/// Key under which an item is persisted.
pub fn storage_key(category: CacheCategory, key: &str) -> String {
    format!("{}{}", category_prefix(category), key)
}

/// Prefix shared by every persisted key of `category`.
pub fn category_prefix(category: CacheCategory) -> String {
    format!("cache_{}_", category.as_str())
}

/// Prefix shared by every persisted key.
pub const STORAGE_PREFIX: &str = "cache_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage that survives process restarts.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key starting with `prefix`; returns how many were removed.
    async fn remove_prefix(&self, prefix: &str) -> Result<usize, StoreError>;
}

/// Process-local store. Useful when no file should be written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - self.entries.len())
    }
}

/// Store backed by one JSON object on disk, rewritten after every change.
#[derive(Debug)]
pub struct JsonFileStore {
    entries: DashMap<String, String>,
    path: PathBuf,
    write_lock: Mutex<()>,
}

fn load_entries(path: &Path) -> Map<String, Value> {
    let parsed = File::open(path)
        .map_err(StoreError::from)
        .and_then(|f| Ok(serde_json::from_reader(BufReader::new(f))?));

    match parsed {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
            metrics::record_persist_failure("read");
            Map::new()
        }
    }
}

impl JsonFileStore {
    /// Open `path`, loading existing entries if the file exists.
    ///
    /// An unreadable or malformed file, and any entry that is not a string,
    /// is skipped with a warning; the store then starts without it. Only a
    /// parent directory that cannot be created is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let entries = DashMap::new();
        if path.exists() {
            for (k, v) in load_entries(&path) {
                match v {
                    Value::String(raw) => {
                        entries.insert(k, raw);
                    }
                    _ => {
                        tracing::warn!(path = %path.display(), key = %k, "Skipping malformed cache entry");
                        metrics::record_persist_failure("read");
                    }
                }
            }
            tracing::info!(path = %path.display(), entries = entries.len(), "Loaded cache file");
        }

        Ok(Self {
            entries,
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let bytes = serde_json::to_vec(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush().await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.flush().await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            storage_key(CacheCategory::BlockchainData, "account_G1"),
            "cache_blockchain_data_account_G1"
        );
        assert!(storage_key(CacheCategory::UserData, "x").starts_with(STORAGE_PREFIX));
    }

    #[tokio::test]
    async fn test_memory_store_prefix_removal() {
        let store = MemoryStore::new();
        store.set("cache_user_data_a", "1".into()).await.unwrap();
        store.set("cache_user_data_b", "2".into()).await.unwrap();
        store.set("cache_wallet_info_a", "3".into()).await.unwrap();

        let removed = store
            .remove_prefix(&category_prefix(CacheCategory::UserData))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("cache_user_data_a", "{\"x\":1}".into()).await.unwrap();
        store.set("cache_user_data_b", "{}".into()).await.unwrap();
        store.remove("cache_user_data_b").await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("cache_user_data_a").await.unwrap().as_deref(),
            Some("{\"x\":1}")
        );
        assert!(reopened.get("cache_user_data_b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("cache_user_data_a").await.unwrap().is_none());
        assert_eq!(store.entries.len(), 0);
    }

    #[tokio::test]
    async fn test_wrongly_shaped_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"cache_user_data_a": 5, "cache_user_data_b": "{}"}"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("cache_user_data_a").await.unwrap().is_none());
        assert_eq!(store.get("cache_user_data_b").await.unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cache.json");
        JsonFileStore::open(&path).unwrap();
        assert!(dir.path().join("state").is_dir());
    }
}
