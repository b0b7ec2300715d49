//! API Key infrastructure implementations
//!
//! Key generation, the cache-backed key store and the lifecycle service.

mod generator;
mod service;
mod store;

pub use generator::{
    fingerprint_key, redact_key, redact_namespaced, ApiKeyGenerator, DEFAULT_KEY_PREFIX,
};
pub use service::{ApiKeyService, DEFAULT_TTL_DAYS};
pub use store::{CacheKeyStore, KEY_NAMESPACE};
