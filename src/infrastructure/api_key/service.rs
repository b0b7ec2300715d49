//! API Key service
//!
//! Issues, validates, revokes and lists API keys on top of a [`KeyStore`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::api_key::{
    validate_owner_id, validate_ttl_days, ApiKeyRecord, KeyStore, SECONDS_PER_DAY,
};
use crate::domain::{Clock, DomainError};

use super::generator::{redact_key, ApiKeyGenerator};

/// Lifetime of a key when the caller does not choose one
pub const DEFAULT_TTL_DAYS: u32 = 30;

/// API key lifecycle manager
#[derive(Debug, Clone)]
pub struct ApiKeyService {
    store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    generator: ApiKeyGenerator,
    default_ttl_days: u32,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            generator: ApiKeyGenerator::default(),
            default_ttl_days: DEFAULT_TTL_DAYS,
        }
    }

    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_default_ttl_days(mut self, days: u32) -> Self {
        self.default_ttl_days = days;
        self
    }

    pub fn default_ttl_days(&self) -> u32 {
        self.default_ttl_days
    }

    /// Issue a new key for `owner_id`
    ///
    /// The key is returned only once the store write has succeeded.
    pub async fn issue(&self, owner_id: &str, ttl_days: Option<u32>) -> Result<String, DomainError> {
        let ttl_days = ttl_days.unwrap_or(self.default_ttl_days);

        validate_owner_id(owner_id)?;
        validate_ttl_days(ttl_days)?;

        let key = self.generator.generate();
        let record = ApiKeyRecord::issue(&key, owner_id, self.clock.now_secs(), ttl_days);
        let ttl = Duration::from_secs(u64::from(ttl_days) * SECONDS_PER_DAY as u64);

        self.store.put(&record, ttl).await?;

        info!(
            owner_id = %owner_id,
            key = %redact_key(&key),
            expires_at = record.expires_at(),
            "API key issued"
        );

        Ok(key)
    }

    /// Resolve a presented key to its owner
    ///
    /// Missing, unknown and expired keys are all `None`. Expired records
    /// are deleted on the way out. A store failure also yields `None`.
    pub async fn validate(&self, key: Option<&str>) -> Option<String> {
        let key = key.filter(|k| !k.is_empty())?;

        let record = match self.store.get(key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key = %redact_key(key), "API key not found");
                return None;
            }
            Err(e) => {
                warn!(key = %redact_key(key), error = %e, "Key store lookup failed, treating key as absent");
                return None;
            }
        };

        if record.is_expired(self.clock.now_secs()) {
            debug!(key = %redact_key(key), expires_at = record.expires_at(), "API key expired");

            if let Err(e) = self.store.delete(key).await {
                warn!(key = %redact_key(key), error = %e, "Failed to delete expired API key");
            }
            return None;
        }

        Some(record.owner_id().to_string())
    }

    /// Delete a key; revoking an absent key is not an error
    pub async fn revoke(&self, key: &str) -> Result<(), DomainError> {
        let existed = self.store.delete(key).await?;

        info!(key = %redact_key(key), existed, "API key revoked");
        Ok(())
    }

    /// All live keys belonging to `owner_id`, oldest first
    ///
    /// Walks the whole key namespace. Administrative use only.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let now = self.clock.now_secs();

        let mut records: Vec<ApiKeyRecord> = self
            .store
            .scan("")
            .await?
            .into_iter()
            .filter(|r| r.owner_id() == owner_id && !r.is_expired(now))
            .collect();

        records.sort_by(|a, b| {
            a.issued_at()
                .cmp(&b.issued_at())
                .then_with(|| a.key().cmp(b.key()))
        });

        debug!(owner_id = %owner_id, count = records.len(), "Listed API keys");
        Ok(records)
    }

    /// Round-trips the key store, for readiness probes
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.store.get("__ping__").await.map(|_| ())
    }
}
