//! API key and owner validation utilities

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during API key validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("Owner ID cannot be empty")]
    EmptyOwnerId,

    #[error("Owner ID exceeds maximum length of {0} characters")]
    OwnerIdTooLong(usize),

    #[error("Owner ID contains invalid character: {0:?}. Whitespace and control characters are not allowed")]
    InvalidOwnerIdCharacter(char),

    #[error("TTL must be at least one day")]
    ZeroTtl,

    #[error("TTL exceeds maximum of {0} days")]
    TtlTooLong(u32),
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(err: ApiKeyValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

const MAX_OWNER_ID_LENGTH: usize = 128;

/// Upper bound on key lifetime, ten years
pub const MAX_TTL_DAYS: u32 = 3650;

/// Validate an owner (principal) identifier
///
/// Rules:
/// - Cannot be empty
/// - Maximum 128 characters
/// - No whitespace or control characters
pub fn validate_owner_id(id: &str) -> Result<(), ApiKeyValidationError> {
    if id.is_empty() {
        return Err(ApiKeyValidationError::EmptyOwnerId);
    }

    if id.chars().count() > MAX_OWNER_ID_LENGTH {
        return Err(ApiKeyValidationError::OwnerIdTooLong(MAX_OWNER_ID_LENGTH));
    }

    if let Some(c) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(ApiKeyValidationError::InvalidOwnerIdCharacter(c));
    }

    Ok(())
}

/// Validate a key lifetime in days
pub fn validate_ttl_days(ttl_days: u32) -> Result<(), ApiKeyValidationError> {
    if ttl_days == 0 {
        return Err(ApiKeyValidationError::ZeroTtl);
    }

    if ttl_days > MAX_TTL_DAYS {
        return Err(ApiKeyValidationError::TtlTooLong(MAX_TTL_DAYS));
    }

    Ok(())
}
