//! Rate limit resolver
//!
//! Turns a presented API key into the caller's flags and effective policy.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::principal::{FlagDirectory, FlagSet};
use crate::domain::rate_limit::{RateLimitPolicy, RateLimitTable};
use crate::infrastructure::api_key::{redact_key, ApiKeyService};

/// Everything the gate learned about the caller
///
/// `api_key` and `owner_id` are set only when the key validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccess {
    pub api_key: Option<String>,
    pub owner_id: Option<String>,
    pub flags: FlagSet,
    pub policy: RateLimitPolicy,
}

impl ResolvedAccess {
    pub fn anonymous(policy: RateLimitPolicy) -> Self {
        Self {
            api_key: None,
            owner_id: None,
            flags: FlagSet::empty(),
            policy,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.owner_id.is_some()
    }
}

/// Composes key validation, the flag directory and the quota table
#[derive(Debug, Clone)]
pub struct RateLimitResolver {
    keys: Arc<ApiKeyService>,
    directory: Arc<dyn FlagDirectory>,
    table: RateLimitTable,
}

impl RateLimitResolver {
    pub fn new(
        keys: Arc<ApiKeyService>,
        directory: Arc<dyn FlagDirectory>,
        table: RateLimitTable,
    ) -> Self {
        Self {
            keys,
            directory,
            table,
        }
    }

    pub fn table(&self) -> &RateLimitTable {
        &self.table
    }

    /// Effective policy for a flag set
    pub fn resolve(&self, flags: &FlagSet) -> RateLimitPolicy {
        self.table.resolve(flags)
    }

    /// Resolve the caller behind an optional API key
    ///
    /// Never fails. Any lookup failure degrades to no flags and the
    /// unauthenticated policy.
    pub async fn resolve_access(&self, api_key: Option<&str>) -> ResolvedAccess {
        let Some(key) = api_key else {
            return ResolvedAccess::anonymous(self.table.unauthenticated());
        };

        let Some(owner_id) = self.keys.validate(Some(key)).await else {
            debug!(key = %redact_key(key), "Presented API key is not valid");
            return ResolvedAccess::anonymous(self.table.unauthenticated());
        };

        let (flags, policy) = match self.directory.flags_of(&owner_id).await {
            Ok(flags) => {
                let policy = self.table.resolve(&flags);
                (flags, policy)
            }
            Err(e) => {
                warn!(
                    owner_id = %owner_id,
                    error = %e,
                    "Flag resolution failed, applying unauthenticated quota"
                );
                (FlagSet::empty(), self.table.unauthenticated())
            }
        };

        debug!(owner_id = %owner_id, flags = %flags, quota = %policy.quota, "Resolved caller");

        ResolvedAccess {
            api_key: Some(key.to_string()),
            owner_id: Some(owner_id),
            flags,
            policy,
        }
    }
}
