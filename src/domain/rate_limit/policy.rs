//! Quotas and the flag to quota table

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::principal::{FlagSet, UserFlag};

/// Requests per minute allowed to callers without a valid key
pub const UNAUTHENTICATED_LIMIT: u64 = 10;

/// Length of a rate-limit window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Maximum admitted requests per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quota {
    Limited(u64),
    Unlimited,
}

impl Quota {
    /// Config form: a negative number means unlimited
    pub fn from_signed(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Limited(value as u64)
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// The numeric limit, `None` when unlimited
    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::Limited(n) => Some(*n),
            Self::Unlimited => None,
        }
    }

    /// The more generous of two quotas
    pub fn max(self, other: Quota) -> Quota {
        match (self, other) {
            (Self::Unlimited, _) | (_, Self::Unlimited) => Self::Unlimited,
            (Self::Limited(a), Self::Limited(b)) => Self::Limited(a.max(b)),
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{}", n),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// An effective quota over a fixed window, derived per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub quota: Quota,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(quota: Quota, window: Duration) -> Self {
        Self { quota, window }
    }

    pub fn is_unlimited(&self) -> bool {
        self.quota.is_unlimited()
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}

/// Maps held flags to an effective policy
#[derive(Debug, Clone)]
pub struct RateLimitTable {
    unauthenticated: u64,
    window: Duration,
    flags: HashMap<UserFlag, Quota>,
}

impl Default for RateLimitTable {
    fn default() -> Self {
        let flags = HashMap::from([
            (UserFlag::User, Quota::Limited(100)),
            (UserFlag::ElevatedUser, Quota::Limited(2500)),
            (UserFlag::Administrator, Quota::Unlimited),
            (UserFlag::SystemOperator, Quota::Unlimited),
        ]);

        Self {
            unauthenticated: UNAUTHENTICATED_LIMIT,
            window: DEFAULT_WINDOW,
            flags,
        }
    }
}

impl RateLimitTable {
    pub fn new(unauthenticated: u64, window: Duration, flags: HashMap<UserFlag, Quota>) -> Self {
        Self {
            unauthenticated,
            window,
            flags,
        }
    }

    /// The most restrictive policy, used for anonymous callers and on failure
    pub fn unauthenticated(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(Quota::Limited(self.unauthenticated), self.window)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Quota mapped to a single flag, if any
    pub fn quota_for(&self, flag: UserFlag) -> Option<Quota> {
        self.flags.get(&flag).copied()
    }

    /// Resolve the effective policy for a flag set
    ///
    /// Takes the maximum over held flags, floored at the unauthenticated
    /// quota. Any unlimited flag wins immediately. Flags only ever grant.
    pub fn resolve(&self, flags: &FlagSet) -> RateLimitPolicy {
        let mut quota = Quota::Limited(self.unauthenticated);

        for flag in flags.iter() {
            let Some(mapped) = self.quota_for(flag) else {
                continue;
            };
            if mapped.is_unlimited() {
                return RateLimitPolicy::new(Quota::Unlimited, self.window);
            }
            quota = quota.max(mapped);
        }

        RateLimitPolicy::new(quota, self.window)
    }
}
