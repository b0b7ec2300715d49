//! Rate limit domain

mod decision;
mod policy;

pub use decision::RateLimitDecision;
pub use policy::{Quota, RateLimitPolicy, RateLimitTable, DEFAULT_WINDOW, UNAUTHENTICATED_LIMIT};
