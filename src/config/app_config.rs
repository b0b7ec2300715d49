use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::principal::{PrincipalDocument, UserFlag};
use crate::domain::rate_limit::{Quota, RateLimitTable};
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, CacheType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub key_store: KeyStoreConfig,
    pub principals: PrincipalsConfig,
    pub api_keys: ApiKeysConfig,
    pub rate_limits: RateLimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reverse proxies in front of the service that append to
    /// `X-Forwarded-For`. Zero ignores the header entirely.
    pub trusted_proxy_hops: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Backing store for API keys and rate-limit counters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyStoreConfig {
    pub backend: CacheType,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub operation_timeout_ms: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalBackend {
    #[default]
    InMemory,
    Postgres,
}

/// Read-only principal store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrincipalsConfig {
    pub backend: PrincipalBackend,
    pub database_url: Option<String>,
    pub operation_timeout_ms: u64,
    /// Principals loaded into the in-memory backend at startup
    pub seed: Vec<SeedPrincipal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPrincipal {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub default_ttl_days: u32,
    pub key_prefix: String,
}

/// Per-minute quotas; a negative value means unlimited
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub unauthenticated: u64,
    pub window_secs: u64,
    pub flags: BTreeMap<String, i64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            trusted_proxy_hops: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            backend: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            operation_timeout_ms: 2_000,
            max_capacity: 100_000,
        }
    }
}

impl Default for PrincipalsConfig {
    fn default() -> Self {
        Self {
            backend: PrincipalBackend::InMemory,
            database_url: None,
            operation_timeout_ms: 2_000,
            seed: Vec::new(),
        }
    }
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            default_ttl_days: 30,
            key_prefix: "key_".to_string(),
        }
    }
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        let flags = BTreeMap::from([
            ("USER".to_string(), 100),
            ("ELEVATED_USER".to_string(), 2500),
            ("ADMINISTRATOR".to_string(), -1),
            ("SYSTEM_OPERATOR".to_string(), -1),
        ]);

        Self {
            unauthenticated: 10,
            window_secs: 60,
            flags,
        }
    }
}

impl KeyStoreConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Cache settings, falling back to `REDIS_URL` when no URL is configured
    pub fn cache_config(&self) -> CacheConfig {
        let redis_url = self
            .redis_url
            .clone()
            .or_else(|| std::env::var("REDIS_URL").ok());

        CacheConfig {
            cache_type: self.backend,
            redis_url,
            key_prefix: self.key_prefix.clone(),
            max_capacity: self.max_capacity,
            operation_timeout: self.operation_timeout(),
        }
    }
}

impl PrincipalsConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Configured URL, falling back to `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }

    /// Seed principals as stored documents
    pub fn seed_documents(&self) -> Vec<(String, PrincipalDocument)> {
        self.seed
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    PrincipalDocument {
                        email: p.email.clone(),
                        flags: Some(p.flags.clone()),
                    },
                )
            })
            .collect()
    }
}

impl RateLimitsConfig {
    /// Build the quota table, rejecting flag names that do not exist
    pub fn table(&self) -> Result<RateLimitTable, DomainError> {
        if self.window_secs == 0 {
            return Err(DomainError::configuration(
                "rate_limits.window_secs must be positive",
            ));
        }

        // Environment overrides arrive lowercased
        let flags: HashMap<UserFlag, Quota> = self
            .flags
            .iter()
            .map(|(name, quota)| {
                let flag = name.to_uppercase().parse::<UserFlag>()?;
                Ok((flag, Quota::from_signed(*quota)))
            })
            .collect::<Result<_, DomainError>>()?;

        Ok(RateLimitTable::new(
            self.unauthenticated,
            Duration::from_secs(self.window_secs),
            flags,
        ))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::principal::FlagSet;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.trusted_proxy_hops, 0);
        assert_eq!(config.api_keys.default_ttl_days, 30);
        assert_eq!(config.api_keys.key_prefix, "key_");
        assert_eq!(config.key_store.backend, CacheType::InMemory);
        assert_eq!(config.key_store.operation_timeout(), Duration::from_secs(2));
        assert_eq!(config.rate_limits.unauthenticated, 10);
    }

    #[test]
    fn test_default_table_matches_tiers() {
        let table = RateLimitsConfig::default().table().unwrap();

        let user: FlagSet = [UserFlag::User].into_iter().collect();
        let elevated: FlagSet = [UserFlag::ElevatedUser].into_iter().collect();
        let admin: FlagSet = [UserFlag::Administrator].into_iter().collect();

        assert_eq!(table.resolve(&user).quota, Quota::Limited(100));
        assert_eq!(table.resolve(&elevated).quota, Quota::Limited(2500));
        assert!(table.resolve(&admin).is_unlimited());
        assert_eq!(table.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_table_rejects_unknown_flag() {
        let mut config = RateLimitsConfig::default();
        config.flags.insert("SUPERUSER".to_string(), 5);

        assert!(matches!(
            config.table(),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_table_accepts_lowercase_env_keys() {
        let mut config = RateLimitsConfig::default();
        config.flags.insert("user".to_string(), 7);

        let table = config.table().unwrap();
        assert_eq!(table.quota_for(UserFlag::User), Some(Quota::Limited(7)));
    }

    #[test]
    fn test_table_rejects_zero_window() {
        let config = RateLimitsConfig {
            window_secs: 0,
            ..Default::default()
        };
        assert!(config.table().is_err());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "key_store": { "backend": "redis", "redis_url": "redis://cache:6379" },
            "logging": { "format": "json" },
            "server": { "trusted_proxy_hops": 1 },
            "principals": {
                "seed": [{ "id": "ops", "email": "ops@example.com", "flags": ["SYSTEM_OPERATOR"] }]
            }
        }))
        .unwrap();

        assert_eq!(config.key_store.backend, CacheType::Redis);
        assert_eq!(config.key_store.operation_timeout_ms, 2_000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.trusted_proxy_hops, 1);
        assert_eq!(config.server.port, 8080);

        let seeded = config.principals.seed_documents();
        assert_eq!(seeded.len(), 1);
        assert!(seeded[0].1.flag_set().unwrap().contains(UserFlag::SystemOperator));
    }
}
