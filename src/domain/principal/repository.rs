//! Principal store and flag directory traits

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{FlagSet, PrincipalDocument};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read access to the external principal store
///
/// The store is owned and written elsewhere; this service only reads it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PrincipalStore: Send + Sync + Debug {
    /// Fetch the document for `owner_id`, `None` if it does not exist
    async fn get(&self, owner_id: &str) -> Result<Option<PrincipalDocument>, DomainError>;

    /// Round-trips the backend, used by readiness probes
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Resolves a principal to the flags it holds
///
/// Missing principals and missing flag attributes resolve to the empty set.
/// Flag names that cannot be validated are an error, never a default.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FlagDirectory: Send + Sync + Debug {
    async fn flags_of(&self, owner_id: &str) -> Result<FlagSet, DomainError>;
}
