//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod cache;
pub mod clock;
pub mod error;
pub mod principal;
pub mod rate_limit;

pub use api_key::{ApiKeyRecord, ApiKeyValidationError, KeyStore};
pub use cache::{Cache, CacheExt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use principal::{FlagDirectory, FlagSet, PrincipalDocument, PrincipalStore, UserFlag};
pub use rate_limit::{Quota, RateLimitDecision, RateLimitPolicy, RateLimitTable};
