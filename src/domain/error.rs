use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Quota of {limit} requests exceeded, resets in {reset_in_seconds}s")]
    QuotaExceeded { limit: u64, reset_in_seconds: u64 },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn quota_exceeded(limit: u64, reset_in_seconds: u64) -> Self {
        Self::QuotaExceeded {
            limit,
            reset_in_seconds,
        }
    }

    /// True for failures of a backing service (store down, timed out)
    /// as opposed to bad input or policy rejections.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Cache { .. } | Self::Unavailable { .. }
        )
    }
}
