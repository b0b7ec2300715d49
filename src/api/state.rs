//! Application state for shared services

use std::sync::Arc;

use crate::domain::principal::PrincipalStore;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::rate_limit::{RateLimitResolver, RateLimiter};

/// Services shared by every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub api_keys: Arc<ApiKeyService>,
    pub resolver: Arc<RateLimitResolver>,
    pub limiter: Arc<RateLimiter>,
    /// Read-only principal store, kept for readiness checks
    pub principals: Arc<dyn PrincipalStore>,
    /// Trusted `X-Forwarded-For` hops for anonymous client addresses
    pub trusted_proxy_hops: usize,
}

impl AppState {
    pub fn new(
        api_keys: Arc<ApiKeyService>,
        resolver: Arc<RateLimitResolver>,
        limiter: Arc<RateLimiter>,
        principals: Arc<dyn PrincipalStore>,
    ) -> Self {
        Self {
            api_keys,
            resolver,
            limiter,
            principals,
            trusted_proxy_hops: 0,
        }
    }

    pub fn with_trusted_proxy_hops(mut self, hops: usize) -> Self {
        self.trusted_proxy_hops = hops;
        self
    }
}
