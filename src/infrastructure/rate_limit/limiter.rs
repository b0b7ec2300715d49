//! Fixed window rate limiter
//!
//! Windows are aligned to `floor(now / window)`. Each (identity, window)
//! pair has its own counter in the shared cache, created with a TTL of one
//! window and bumped with a single atomic increment.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::cache::Cache;
use crate::domain::rate_limit::{RateLimitDecision, RateLimitPolicy};
use crate::domain::{Clock, DomainError};
use crate::infrastructure::api_key::redact_namespaced;
use crate::infrastructure::cache::InMemoryCache;

/// Namespace for window counters in the backing cache
pub const COUNTER_NAMESPACE: &str = "ratelimit:";

/// Counts requests per identity and window
///
/// When the shared counter store fails, requests are counted in a
/// process-local cache against the fallback policy instead.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    local: Arc<InMemoryCache>,
    fallback: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>, fallback: RateLimitPolicy) -> Self {
        Self {
            cache,
            local: Arc::new(InMemoryCache::new()),
            fallback,
            clock,
        }
    }

    fn counter_key(identity: &str, window_index: i64) -> String {
        format!("{}{}:{}", COUNTER_NAMESPACE, identity, window_index)
    }

    /// Consume one unit of quota for `identity`
    ///
    /// Unlimited policies are still counted. If the counter store fails
    /// the request is counted locally under the fallback policy.
    pub async fn check(&self, identity: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let decision = match self.count(self.cache.as_ref(), identity, policy).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    identity = %redact_namespaced(identity),
                    error = %e,
                    "Rate limit counter unavailable, counting locally"
                );
                self.count_locally(identity).await
            }
        };

        debug!(
            identity = %redact_namespaced(identity),
            quota = %decision.quota,
            remaining = ?decision.remaining,
            allowed = decision.allowed,
            "Rate limit checked"
        );

        decision
    }

    async fn count(
        &self,
        cache: &dyn Cache,
        identity: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, DomainError> {
        let window = policy.window_secs() as i64;
        let now = self.clock.now_secs();

        let window_index = now.div_euclid(window);
        let reset_in_seconds = (window - now.rem_euclid(window)) as u64;
        let key = Self::counter_key(identity, window_index);

        let count = cache
            .increment_with_ttl(&key, 1, Duration::from_secs(window as u64))
            .await?;

        Ok(RateLimitDecision::from_count(
            policy,
            u64::try_from(count).unwrap_or(0),
            reset_in_seconds,
        ))
    }

    async fn count_locally(&self, identity: &str) -> RateLimitDecision {
        match self.count(self.local.as_ref(), identity, &self.fallback).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(error = %e, "Local rate limit counter failed");

                let window = self.fallback.window_secs() as i64;
                let reset_in_seconds = (window - self.clock.now_secs().rem_euclid(window)) as u64;
                RateLimitDecision::admitted_uncounted(&self.fallback, reset_in_seconds)
            }
        }
    }
}
