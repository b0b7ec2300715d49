//! keygate
//!
//! API key issuance and validation with a tiered, flag-driven rate-limiting
//! gate in front of a handful of utility endpoints.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::api::state::AppState;
use crate::config::PrincipalBackend;
use crate::domain::{Cache, Clock, PrincipalStore, SystemClock};
use crate::infrastructure::{
    api_key::{ApiKeyGenerator, ApiKeyService, CacheKeyStore},
    cache::CacheFactory,
    principal::{InMemoryPrincipalStore, PostgresPrincipalStore, StoreFlagDirectory},
    rate_limit::{RateLimitResolver, RateLimiter},
};

/// Create the application state from configuration, connecting backends
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = CacheFactory::new()
        .create(&config.key_store.cache_config())
        .await
        .context("Failed to initialize key store")?;

    let principals = create_principal_store(config).await?;

    build_app_state(config, cache, principals, Arc::new(SystemClock))
}

/// Wire services over already-built backends
///
/// Keys and rate-limit counters share `cache`.
pub fn build_app_state(
    config: &AppConfig,
    cache: Arc<dyn Cache>,
    principals: Arc<dyn PrincipalStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AppState> {
    let table = config
        .rate_limits
        .table()
        .context("Invalid rate_limits configuration")?;

    let key_store = Arc::new(CacheKeyStore::new(cache.clone()));
    let api_keys = Arc::new(
        ApiKeyService::new(key_store, clock.clone())
            .with_generator(ApiKeyGenerator::new(config.api_keys.key_prefix.clone()))
            .with_default_ttl_days(config.api_keys.default_ttl_days),
    );

    let directory = Arc::new(StoreFlagDirectory::new(
        principals.clone(),
        config.principals.operation_timeout(),
    ));

    let limiter = Arc::new(RateLimiter::new(cache, clock, table.unauthenticated()));
    let resolver = Arc::new(RateLimitResolver::new(api_keys.clone(), directory, table));

    Ok(AppState::new(api_keys, resolver, limiter, principals)
        .with_trusted_proxy_hops(config.server.trusted_proxy_hops))
}

async fn create_principal_store(config: &AppConfig) -> anyhow::Result<Arc<dyn PrincipalStore>> {
    match config.principals.backend {
        PrincipalBackend::InMemory => {
            let seed = config.principals.seed_documents();
            info!(principals = seed.len(), "Using in-memory principal store");

            Ok(Arc::new(InMemoryPrincipalStore::with_principals(seed)))
        }
        PrincipalBackend::Postgres => {
            let url = config
                .principals
                .database_url()
                .context("principals.database_url or DATABASE_URL is required for postgres")?;

            let store =
                PostgresPrincipalStore::connect(&url, config.principals.operation_timeout())
                    .await
                    .context("Failed to connect to principal store")?;

            info!("Using PostgreSQL principal store");
            Ok(Arc::new(store))
        }
    }
}
