//! Rate limiting infrastructure

mod limiter;
mod resolver;

pub use limiter::{RateLimiter, COUNTER_NAMESPACE};
pub use resolver::{RateLimitResolver, ResolvedAccess};
