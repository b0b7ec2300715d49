//! Redis cache implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};

use crate::domain::cache::Cache;
use crate::domain::DomainError;
use crate::infrastructure::api_key::redact_namespaced;

/// Adds to a counter and sets its expiry only if it has none yet
const INCREMENT_WITH_TTL: &str = r#"
local value = redis.call('INCRBY', KEYS[1], ARGV[1])
if redis.call('PTTL', KEYS[1]) < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return value
"#;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Upper bound on any single operation
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Shared across instances, so key records and rate-limit counters are
/// consistent cluster-wide. Every call is bounded by the operation timeout.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    increment_script: Script,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                DomainError::unavailable(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| DomainError::unavailable(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            increment_script: Script::new(INCREMENT_WITH_TTL),
            config,
        })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        match &self.config.key_prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(key),
            None => key,
        }
    }

    /// Runs one Redis call under the operation timeout
    ///
    /// Errors name `key` only in redacted form.
    async fn bounded<T, F>(&self, action: &str, key: &str, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(action, key, e)),
            Err(_) => Err(DomainError::unavailable(format!(
                "Redis {} of '{}' timed out after {:?}",
                action,
                redact_namespaced(key),
                self.config.operation_timeout
            ))),
        }
    }
}

fn map_redis_error(action: &str, key: &str, e: RedisError) -> DomainError {
    let message = format!("Failed to {} key '{}': {}", action, redact_namespaced(key), e);

    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        DomainError::unavailable(message)
    } else {
        DomainError::cache(message)
    }
}

/// Escape glob metacharacters for use in a SCAN MATCH pattern
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.bounded("get", key, conn.get(&prefixed_key)).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        self.bounded("set", key, conn.set_ex(&prefixed_key, value, ttl_secs))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i64 = self.bounded("delete", key, conn.del(&prefixed_key)).await?;
        Ok(deleted > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
        let pattern = format!("{}*", escape_glob(&self.prefix_key(prefix)));
        let mut conn = self.connection.clone();

        let mut cursor = 0u64;
        let mut entries = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = self
                .bounded(
                    "scan",
                    prefix,
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn),
                )
                .await?;

            if !keys.is_empty() {
                let values: Vec<Option<String>> = self
                    .bounded(
                        "read",
                        prefix,
                        redis::cmd("MGET").arg(&keys).query_async(&mut conn),
                    )
                    .await?;

                // Entries can expire between SCAN and MGET
                for (key, value) in keys.iter().zip(values) {
                    if let Some(value) = value {
                        entries.push((self.strip_prefix(key).to_string(), value));
                    }
                }
            }

            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(entries)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.bounded("check", key, conn.exists(&prefixed_key)).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_ms: i64 = self
            .bounded(
                "read TTL of",
                key,
                redis::cmd("PTTL").arg(&prefixed_key).query_async(&mut conn),
            )
            .await?;

        // -2 if the key doesn't exist, -1 if it has no TTL
        if ttl_ms < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(ttl_ms as u64)))
        }
    }

    async fn increment_with_ttl(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_ms = ttl.as_millis().max(1) as u64;

        self.bounded(
            "increment",
            key,
            self.increment_script
                .key(&prefixed_key)
                .arg(delta)
                .arg(ttl_ms)
                .invoke_async(&mut conn),
        )
        .await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = self
            .bounded("ping", "-", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    // These tests require a running Redis instance:
    // cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("keygate-test")
    }

    #[test]
    fn test_errors_redact_keys() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_redis_error(
            "get",
            "apikey:key_abcdefghijklmnopqrstuvwxyz",
            RedisError::from(io),
        );

        assert!(matches!(err, DomainError::Unavailable { .. }));

        let message = err.to_string();
        assert!(message.contains("apikey:key_abcdefgh..."));
        assert!(!message.contains("ijklmnop"));
    }

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("apikey:"), "apikey:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_scan_prefix_strips_namespace() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set_raw("apikey:scan-a", "1", Duration::from_secs(60))
            .await
            .unwrap();

        let entries = cache.scan_prefix("apikey:scan-").await.unwrap();
        assert_eq!(entries, vec![("apikey:scan-a".to_string(), "1".to_string())]);

        cache.delete("apikey:scan-a").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_increment_with_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        cache.delete("counter").await.unwrap();

        let val = cache
            .increment_with_ttl("counter", 1, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(val, 1);

        let val = cache
            .increment_with_ttl("counter", 2, Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(val, 3);

        let ttl = cache.ttl("counter").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(30));

        cache.delete("counter").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        cache.ping().await.unwrap();
    }
}
