//! API key record

use serde::{Deserialize, Serialize};

/// Seconds in one day, used to turn `ttl_days` into a store TTL
pub const SECONDS_PER_DAY: i64 = 86_400;

/// An issued API key and the principal it resolves to
///
/// `expires_at` is fixed at issuance and never changes; a record found in
/// the store is either still valid or waiting to be evicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// The opaque key as presented by callers
    key: String,
    /// Principal the key belongs to (a reference into the flag directory)
    owner_id: String,
    /// Issuance time, seconds since epoch
    issued_at: i64,
    /// Absolute expiry, seconds since epoch
    expires_at: i64,
}

impl ApiKeyRecord {
    /// Build a record that expires `ttl_days` after `issued_at`
    pub fn issue(
        key: impl Into<String>,
        owner_id: impl Into<String>,
        issued_at: i64,
        ttl_days: u32,
    ) -> Self {
        Self {
            key: key.into(),
            owner_id: owner_id.into(),
            issued_at,
            expires_at: issued_at + i64::from(ttl_days) * SECONDS_PER_DAY,
        }
    }

    /// Rebuild a record read back from storage
    pub fn from_parts(
        key: impl Into<String>,
        owner_id: impl Into<String>,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            key: key.into(),
            owner_id: owner_id.into(),
            issued_at,
            expires_at,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Seconds of life left at `now`, zero once expired
    pub fn remaining_secs(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at - now).unwrap_or(0)
    }

    /// A key is expired from its expiry second onward
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
