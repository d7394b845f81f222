// Per-platform account cache.
//
// One record per platform, shaped `{platform, accounts, cachedAt}`, kept in a
// pluggable key-value store. `AccountCache` never reports store failures to
// its callers: a failed read is a miss and a failed write is dropped, so the
// services always fall through to a network fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::error::CacheError;
use crate::expiry;
use crate::platform::Platform;

/// How long a cached account list is trusted.
pub const ACCOUNT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// The persisted record for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAccountSet {
    pub platform: Platform,
    pub accounts: Vec<Account>,
    /// Epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

impl CachedAccountSet {
    pub fn is_valid(&self, ttl: Duration) -> bool {
        is_cache_valid(self.cached_at, ttl)
    }

    /// Whether every cached account still holds an unexpired token.
    pub fn all_tokens_valid(&self) -> bool {
        let now = Utc::now();
        self.accounts.iter().all(|acc| !expiry::is_expired_at(acc, now))
    }
}

/// `(now - cached_at) < ttl`. An entry exactly `ttl` old is stale.
pub fn is_cache_valid(cached_at: DateTime<Utc>, ttl: Duration) -> bool {
    is_cache_valid_at(cached_at, ttl, Utc::now())
}

pub fn is_cache_valid_at(cached_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let age_ms = (now - cached_at).num_milliseconds() as i128;
    age_ms < ttl.as_millis() as i128
}

/// Durable storage behind the account cache.
#[async_trait]
pub trait AccountCacheStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, platform: Platform) -> Result<Option<CachedAccountSet>, CacheError>;

    /// Insert or overwrite the record for `entry.platform`.
    async fn put(&self, entry: CachedAccountSet) -> Result<(), CacheError>;

    async fn delete(&self, platform: Platform) -> Result<(), CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;
}

/// Process-local store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<Platform, CachedAccountSet>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Platform, CachedAccountSet>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Read(format!("cache lock poisoned: {e}")))
    }
}

#[async_trait]
impl AccountCacheStore for MemoryCacheStore {
    async fn get(&self, platform: Platform) -> Result<Option<CachedAccountSet>, CacheError> {
        Ok(self.lock()?.get(&platform).cloned())
    }

    async fn put(&self, entry: CachedAccountSet) -> Result<(), CacheError> {
        self.lock()?.insert(entry.platform, entry);
        Ok(())
    }

    async fn delete(&self, platform: Platform) -> Result<(), CacheError> {
        self.lock()?.remove(&platform);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }
}

/// Durable store keeping one JSON document per platform in a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}.json", platform.as_str()))
    }
}

#[async_trait]
impl AccountCacheStore for FileCacheStore {
    async fn get(&self, platform: Platform) -> Result<Option<CachedAccountSet>, CacheError> {
        let raw = match tokio::fs::read(self.entry_path(platform)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Read(e.to_string())),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    async fn put(&self, entry: CachedAccountSet) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec(&entry)?;
        // One temp sibling per write, then rename over the entry.
        let path = self.entry_path(entry.platform);
        let tmp = path.with_extension(format!("json.{}.tmp", nanoid::nanoid!()));
        let written = match tokio::fs::write(&tmp, body).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Write(e.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, platform: Platform) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.entry_path(platform)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Write(e.to_string())),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for platform in Platform::ALL {
            self.delete(platform).await?;
        }
        Ok(())
    }
}

/// Error-swallowing facade over an [`AccountCacheStore`], shared by every
/// platform service.
#[derive(Debug, Clone)]
pub struct AccountCache {
    store: Arc<dyn AccountCacheStore>,
    enabled: bool,
}

impl Default for AccountCache {
    fn default() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()))
    }
}

impl AccountCache {
    pub fn new(store: Arc<dyn AccountCacheStore>) -> Self {
        Self { store, enabled: true }
    }

    /// A cache that never hits and never stores.
    pub fn disabled() -> Self {
        Self {
            store: Arc::new(MemoryCacheStore::new()),
            enabled: false,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn store(&self) -> &Arc<dyn AccountCacheStore> {
        &self.store
    }

    pub async fn get(&self, platform: Platform) -> Option<CachedAccountSet> {
        if !self.enabled {
            return None;
        }
        match self.store.get(platform).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to get cached accounts for {}: {}", platform, e);
                None
            }
        }
    }

    /// Store `accounts` for `platform`, stamped with the current time.
    pub async fn put(&self, platform: Platform, accounts: Vec<Account>) {
        if !self.enabled {
            return;
        }
        let entry = CachedAccountSet {
            platform,
            accounts,
            cached_at: Utc::now(),
        };
        if let Err(e) = self.store.put(entry).await {
            tracing::warn!("Failed to cache accounts for {}: {}", platform, e);
        }
    }

    pub async fn clear(&self, platform: Platform) {
        if let Err(e) = self.store.delete(platform).await {
            tracing::warn!("Failed to clear cache for {}: {}", platform, e);
        }
    }

    pub async fn clear_all(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!("Failed to clear all account cache: {}", e);
        }
    }
}
