//! API Key domain
//!
//! Records for issued keys, the expiring store they live in, and the
//! validation rules applied at issuance.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKeyRecord, SECONDS_PER_DAY};
pub use repository::KeyStore;
pub use validation::{
    validate_owner_id, validate_ttl_days, ApiKeyValidationError, MAX_TTL_DAYS,
};

#[cfg(test)]
pub use repository::MockKeyStore;
