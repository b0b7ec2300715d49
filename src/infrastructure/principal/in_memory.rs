//! In-memory principal store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::principal::{PrincipalDocument, PrincipalStore};
use crate::domain::DomainError;

/// Principal store held in process memory, seeded from config or tests
#[derive(Debug, Default)]
pub struct InMemoryPrincipalStore {
    principals: Arc<RwLock<HashMap<String, PrincipalDocument>>>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principals(
        principals: impl IntoIterator<Item = (String, PrincipalDocument)>,
    ) -> Self {
        Self {
            principals: Arc::new(RwLock::new(principals.into_iter().collect())),
        }
    }

    /// Add or replace a principal
    pub async fn insert(&self, owner_id: impl Into<String>, document: PrincipalDocument) {
        self.principals
            .write()
            .await
            .insert(owner_id.into(), document);
    }

    pub async fn remove(&self, owner_id: &str) -> bool {
        self.principals.write().await.remove(owner_id).is_some()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn get(&self, owner_id: &str) -> Result<Option<PrincipalDocument>, DomainError> {
        let principals = self.principals.read().await;
        Ok(principals.get(owner_id).cloned())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
