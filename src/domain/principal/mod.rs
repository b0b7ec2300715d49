//! Principal domain
//!
//! Permission flags, the stored principal document, and the read-only
//! traits used to resolve an owner to its flags.

mod entity;
mod repository;

pub use entity::{FlagSet, PrincipalDocument, UserFlag};
pub use repository::{FlagDirectory, PrincipalStore};

#[cfg(test)]
pub use repository::{MockFlagDirectory, MockPrincipalStore};
