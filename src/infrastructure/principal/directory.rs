//! Flag directory over a principal store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::principal::{FlagDirectory, FlagSet, PrincipalStore};
use crate::domain::DomainError;

/// Resolves flags by reading the principal store under a timeout
#[derive(Debug, Clone)]
pub struct StoreFlagDirectory {
    store: Arc<dyn PrincipalStore>,
    timeout: Duration,
}

impl StoreFlagDirectory {
    pub fn new(store: Arc<dyn PrincipalStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl FlagDirectory for StoreFlagDirectory {
    async fn flags_of(&self, owner_id: &str) -> Result<FlagSet, DomainError> {
        let document = tokio::time::timeout(self.timeout, self.store.get(owner_id))
            .await
            .map_err(|_| {
                DomainError::unavailable(format!(
                    "Principal lookup for '{}' timed out after {:?}",
                    owner_id, self.timeout
                ))
            })??;

        let Some(document) = document else {
            debug!(owner_id = %owner_id, "Principal not found, no flags");
            return Ok(FlagSet::empty());
        };

        // One unrecognized flag rejects the whole record
        document.flag_set().inspect_err(|e| {
            warn!(owner_id = %owner_id, error = %e, "Principal record has invalid flags");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::principal::{MockPrincipalStore, PrincipalDocument, UserFlag};
    use crate::infrastructure::principal::InMemoryPrincipalStore;

    fn directory(store: impl PrincipalStore + 'static) -> StoreFlagDirectory {
        StoreFlagDirectory::new(Arc::new(store), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_flags_of_known_principal() {
        let store = InMemoryPrincipalStore::with_principals([(
            "u1".to_string(),
            PrincipalDocument::new("u1@example.com", &[UserFlag::User, UserFlag::ElevatedUser]),
        )]);

        let flags = directory(store).flags_of("u1").await.unwrap();
        assert_eq!(flags.len(), 2);
        assert!(flags.contains(UserFlag::ElevatedUser));
    }

    #[tokio::test]
    async fn test_missing_principal_or_flags_is_empty() {
        let store = InMemoryPrincipalStore::with_principals([(
            "no-flags".to_string(),
            PrincipalDocument {
                email: Some("x@example.com".to_string()),
                flags: None,
            },
        )]);
        let directory = directory(store);

        assert!(directory.flags_of("no-flags").await.unwrap().is_empty());
        assert!(directory.flags_of("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_flag_rejects_read() {
        let store = InMemoryPrincipalStore::with_principals([(
            "u1".to_string(),
            PrincipalDocument {
                email: None,
                flags: Some(vec!["USER".to_string(), "SUPERUSER".to_string()]),
            },
        )]);

        let result = directory(store).flags_of("u1").await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockPrincipalStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::storage("connection reset")));

        let result = directory(store).flags_of("u1").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[derive(Debug)]
    struct SlowStore;

    #[async_trait]
    impl PrincipalStore for SlowStore {
        async fn get(&self, _owner_id: &str) -> Result<Option<PrincipalDocument>, DomainError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn ping(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let result = directory(SlowStore).flags_of("u1").await;
        assert!(matches!(result, Err(DomainError::Unavailable { .. })));
    }
}
