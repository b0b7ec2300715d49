//! Layered application configuration

mod app_config;

pub use app_config::{
    ApiKeysConfig, AppConfig, KeyStoreConfig, LogFormat, LoggingConfig, PrincipalBackend,
    PrincipalsConfig, RateLimitsConfig, SeedPrincipal, ServerConfig,
};
