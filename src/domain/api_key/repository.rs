//! Key store trait

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use super::entity::ApiKeyRecord;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Expiring storage for API key records
///
/// `get` does not check `expires_at`; backend eviction and the application
/// clock can disagree, so callers compare against their own clock and
/// delete what they find expired.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyStore: Send + Sync + Debug {
    /// Store a record and let the backend evict it after `ttl`
    async fn put(&self, record: &ApiKeyRecord, ttl: Duration) -> Result<(), DomainError>;

    /// Look up a record by its key
    async fn get(&self, key: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Delete a record, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Enumerate all records whose key starts with `key_prefix`
    ///
    /// Walks the whole namespace; never call it per request.
    async fn scan(&self, key_prefix: &str) -> Result<Vec<ApiKeyRecord>, DomainError>;
}
