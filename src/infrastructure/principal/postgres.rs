//! PostgreSQL principal store
//!
//! Reads `principals(id TEXT PRIMARY KEY, email TEXT, flags JSONB)`. The
//! table is owned by the user management system; this store never writes it.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;

use crate::domain::principal::{PrincipalDocument, PrincipalStore};
use crate::domain::DomainError;

/// PostgreSQL implementation of PrincipalStore
#[derive(Debug, Clone)]
pub struct PostgresPrincipalStore {
    pool: PgPool,
}

impl PostgresPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool whose acquire wait is bounded by `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(url)
            .await
            .map_err(|e| DomainError::unavailable(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PrincipalStore for PostgresPrincipalStore {
    async fn get(&self, owner_id: &str) -> Result<Option<PrincipalDocument>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT email, flags
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get principal: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let email: Option<String> = row
            .try_get("email")
            .map_err(|e| DomainError::storage(format!("Failed to read principal email: {}", e)))?;

        let flags: Option<Json<Vec<String>>> = row.try_get("flags").map_err(|e| {
            DomainError::configuration(format!(
                "Principal '{}' has malformed flags: {}",
                owner_id, e
            ))
        })?;

        Ok(Some(PrincipalDocument {
            email,
            flags: flags.map(|Json(flags)| flags),
        }))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("PostgreSQL ping failed: {}", e)))?;
        Ok(())
    }
}
