//! Outcome of consuming one unit of quota

use super::policy::{Quota, RateLimitPolicy};
use crate::domain::DomainError;

/// Result of counting a request against a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub quota: Quota,
    /// Requests left in the window, `None` when unlimited
    pub remaining: Option<u64>,
    /// Seconds until the current window closes
    pub reset_in_seconds: u64,
}

impl RateLimitDecision {
    /// Decide from the post-increment counter value
    pub fn from_count(policy: &RateLimitPolicy, count: u64, reset_in_seconds: u64) -> Self {
        match policy.quota {
            Quota::Unlimited => Self {
                allowed: true,
                quota: Quota::Unlimited,
                remaining: None,
                reset_in_seconds,
            },
            Quota::Limited(limit) => Self {
                allowed: count <= limit,
                quota: policy.quota,
                remaining: Some(limit.saturating_sub(count)),
                reset_in_seconds,
            },
        }
    }

    /// Admit without counting, used when the counter store is down
    pub fn admitted_uncounted(policy: &RateLimitPolicy, reset_in_seconds: u64) -> Self {
        Self {
            allowed: true,
            quota: policy.quota,
            remaining: policy.quota.limit(),
            reset_in_seconds,
        }
    }

    /// Convert a rejection into its error, `Ok` when admitted
    pub fn into_result(self) -> Result<Self, DomainError> {
        match (self.allowed, self.quota) {
            (false, Quota::Limited(limit)) => {
                Err(DomainError::quota_exceeded(limit, self.reset_in_seconds))
            }
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limited(n: u64) -> RateLimitPolicy {
        RateLimitPolicy::new(Quota::Limited(n), Duration::from_secs(60))
    }

    #[test]
    fn test_boundary() {
        let policy = limited(3);

        let d = RateLimitDecision::from_count(&policy, 3, 20);
        assert!(d.allowed);
        assert_eq!(d.remaining, Some(0));

        let d = RateLimitDecision::from_count(&policy, 4, 20);
        assert!(!d.allowed);
        assert_eq!(d.remaining, Some(0));
    }

    #[test]
    fn test_unlimited_always_allowed() {
        let policy = RateLimitPolicy::new(Quota::Unlimited, Duration::from_secs(60));
        let d = RateLimitDecision::from_count(&policy, 1_000_000, 5);

        assert!(d.allowed);
        assert_eq!(d.remaining, None);
    }

    #[test]
    fn test_rejection_carries_reset() {
        let err = RateLimitDecision::from_count(&limited(1), 2, 42)
            .into_result()
            .unwrap_err();

        match err {
            DomainError::QuotaExceeded {
                limit,
                reset_in_seconds,
            } => {
                assert_eq!(limit, 1);
                assert_eq!(reset_in_seconds, 42);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
