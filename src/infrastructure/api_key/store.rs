//! Cache-backed key store
//!
//! Records live under `apikey:{key}` as JSON
//! `{"user_id": .., "created_at": .., "expires_at": ..}` with the backend
//! TTL set to the key lifetime.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::api_key::{ApiKeyRecord, KeyStore};
use crate::domain::cache::{Cache, CacheExt};
use crate::domain::DomainError;

/// Namespace for key records in the backing cache
pub const KEY_NAMESPACE: &str = "apikey:";

#[derive(Debug, Serialize, Deserialize)]
struct StoredKey {
    user_id: String,
    created_at: i64,
    expires_at: i64,
}

impl StoredKey {
    fn into_record(self, key: &str) -> ApiKeyRecord {
        ApiKeyRecord::from_parts(key, self.user_id, self.created_at, self.expires_at)
    }
}

impl From<&ApiKeyRecord> for StoredKey {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            user_id: record.owner_id().to_string(),
            created_at: record.issued_at(),
            expires_at: record.expires_at(),
        }
    }
}

/// [`KeyStore`] over any [`Cache`] backend
#[derive(Debug, Clone)]
pub struct CacheKeyStore {
    cache: Arc<dyn Cache>,
}

impl CacheKeyStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", KEY_NAMESPACE, key)
    }
}

#[async_trait]
impl KeyStore for CacheKeyStore {
    async fn put(&self, record: &ApiKeyRecord, ttl: Duration) -> Result<(), DomainError> {
        self.cache
            .set(
                &Self::storage_key(record.key()),
                &StoredKey::from(record),
                ttl,
            )
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let stored: Option<StoredKey> = self.cache.get(&Self::storage_key(key)).await?;
        Ok(stored.map(|s| s.into_record(key)))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.cache.delete(&Self::storage_key(key)).await
    }

    async fn scan(&self, key_prefix: &str) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let entries = self
            .cache
            .scan_prefix(&Self::storage_key(key_prefix))
            .await?;

        let mut records = Vec::with_capacity(entries.len());

        for (storage_key, raw) in entries {
            let Some(key) = storage_key.strip_prefix(KEY_NAMESPACE) else {
                continue;
            };

            match serde_json::from_str::<StoredKey>(&raw) {
                Ok(stored) => records.push(stored.into_record(key)),
                Err(e) => warn!(error = %e, "Skipping unreadable key record"),
            }
        }

        Ok(records)
    }
}
