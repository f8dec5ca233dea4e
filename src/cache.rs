use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Configuration for response caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    pub path: PathBuf,
}

/// Get the platform-appropriate cache directory for f1-repoint
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("f1-repoint/api-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/f1-repoint/api-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove every cached entry under `cache_path`
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Number of entries persisted under `cache_path`
pub fn entry_count(cache_path: &Path) -> usize {
    if !cache_path.exists() {
        return 0;
    }
    cacache::list_sync(cache_path).filter_map(|entry| entry.ok()).count()
}

/// A normalized response stored under a deterministic request key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Key-value cache backed by cacache on disk with an in-memory map in front.
///
/// Entries are never expired. Writing a key that already exists replaces the
/// entry; callers only write deterministic content, so the replacement is
/// equivalent to the original.
#[derive(Clone, Debug)]
pub struct DiskCache {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
    cache_path: Option<PathBuf>, // None = memory only
}

impl DiskCache {
    pub fn new(cache_path: PathBuf) -> Self {
        // Don't pre-load disk cache - entries are loaded on demand
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path: Some(cache_path),
        }
    }

    /// A cache that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path: None,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.path.clone())
        } else {
            Self::in_memory()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.lock().get(key) {
            return Some(entry.clone());
        }
        self.load_from_disk(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store `payload` under `key` in memory and, when persistent, on disk
    pub fn put(&self, key: &str, payload: Value) -> Result<CacheEntry> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            created_at: Utc::now(),
        };

        self.lock().insert(key.to_string(), entry.clone());

        if let Some(cache_path) = &self.cache_path {
            let serialized = serde_json::to_vec(&entry).context("Failed to serialize cache entry")?;
            cacache::write_sync(cache_path, key, &serialized)
                .with_context(|| format!("Failed to write cache entry {}", key))?;
        }

        Ok(entry)
    }

    /// Remove all entries, both in memory and on disk
    pub fn clear(&self) -> Result<()> {
        self.lock().clear();
        match &self.cache_path {
            Some(path) => clear_cache(path),
            None => Ok(()),
        }
    }

    fn load_from_disk(&self, key: &str) -> Option<CacheEntry> {
        let cache_path = self.cache_path.as_ref()?;
        let bytes = cacache::read_sync(cache_path, key).ok()?;

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        debug!(key, "Loaded cache entry from disk");
        self.lock().insert(key.to_string(), entry.clone());
        Some(entry)
    }
}
