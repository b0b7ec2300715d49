//! In-memory cache implementation using moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use tokio::sync::Mutex;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of live counters
    ///
    /// Records written through `set_raw` are bounded only by their TTL so
    /// that counter churn can never evict or refuse them.
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

impl CacheEntry {
    fn time_to_live(&self) -> Duration {
        Duration::from_millis(
            self.expires_at
                .saturating_sub(InMemoryCache::current_time_millis()),
        )
    }
}

/// Hands each entry's own deadline to moka so it is evicted on time
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.time_to_live())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.time_to_live())
    }
}

/// Single-process cache backed by moka
///
/// Records and counters live in separate moka caches. Only the counter
/// cache is capacity bounded. Both expire entries at their own deadline.
/// Counter increments are serialized through one async mutex so that
/// read-add-write is atomic with respect to other increments.
#[derive(Debug)]
pub struct InMemoryCache {
    records: MokaCache<String, CacheEntry>,
    counters: MokaCache<String, CacheEntry>,
    counter_lock: Mutex<()>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let records = MokaCache::builder().expire_after(EntryExpiry).build();

        let counters = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self {
            records,
            counters,
            counter_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() >= entry.expires_at
    }

    fn entry(value: &str, ttl: Duration) -> CacheEntry {
        CacheEntry {
            data: value.to_string(),
            expires_at: Self::current_time_millis() + ttl.as_millis() as u64,
        }
    }

    /// Live entry for `key` in `cache`, evicting it if expired
    async fn live_in(cache: &MokaCache<String, CacheEntry>, key: &str) -> Option<CacheEntry> {
        let entry = cache.get(key).await?;

        if Self::is_expired(&entry) {
            cache.remove(key).await;
            return None;
        }

        Some(entry)
    }

    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        match Self::live_in(&self.records, key).await {
            Some(entry) => Some(entry),
            None => Self::live_in(&self.counters, key).await,
        }
    }

    async fn live_with_prefix(
        cache: &MokaCache<String, CacheEntry>,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, DomainError> {
        cache.run_pending_tasks().await;

        let now = Self::current_time_millis();
        let prefix = prefix.to_string();
        let cache = cache.clone();

        tokio::task::spawn_blocking(move || {
            cache
                .iter()
                .filter(|(k, entry)| k.starts_with(&prefix) && entry.expires_at > now)
                .map(|(k, entry)| (k.to_string(), entry.data))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.counters.remove(key).await;
        self.records
            .insert(key.to_string(), Self::entry(value, ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let record = self.records.remove(key).await;
        let counter = self.counters.remove(key).await;

        Ok(record
            .into_iter()
            .chain(counter)
            .any(|entry| !Self::is_expired(&entry)))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
        let mut entries = Self::live_with_prefix(&self.records, prefix).await?;
        entries.extend(Self::live_with_prefix(&self.counters, prefix).await?);
        Ok(entries)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live_entry(key).await.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.time_to_live()))
    }

    async fn increment_with_ttl(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, DomainError> {
        let _guard = self.counter_lock.lock().await;

        let (current, expires_at) = match Self::live_in(&self.counters, key).await {
            Some(entry) => {
                let current: i64 = entry.data.parse().map_err(|e| {
                    DomainError::cache(format!("Value at '{}' is not a counter: {}", key, e))
                })?;
                (current, entry.expires_at)
            }
            None => (0, Self::current_time_millis() + ttl.as_millis() as u64),
        };

        let new_value = current + delta;
        let entry = CacheEntry {
            data: new_value.to_string(),
            expires_at,
        };

        self.counters.insert(key.to_string(), entry).await;
        Ok(new_value)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
