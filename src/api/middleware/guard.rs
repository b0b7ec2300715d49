//! Flag requirements for route groups

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::api::types::ApiError;
use crate::domain::principal::{FlagSet, UserFlag};
use crate::domain::DomainError;
use crate::infrastructure::rate_limit::ResolvedAccess;

/// How a set of required flags is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    All,
    Any,
}

impl MatchMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

/// Flags a caller must hold to reach a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRequirement {
    flags: FlagSet,
    mode: MatchMode,
}

impl FlagRequirement {
    pub fn new(flags: impl IntoIterator<Item = UserFlag>, mode: MatchMode) -> Self {
        Self {
            flags: flags.into_iter().collect(),
            mode,
        }
    }

    /// Caller must hold every listed flag
    pub fn all(flags: impl IntoIterator<Item = UserFlag>) -> Self {
        Self::new(flags, MatchMode::All)
    }

    /// Caller must hold at least one listed flag
    pub fn any(flags: impl IntoIterator<Item = UserFlag>) -> Self {
        Self::new(flags, MatchMode::Any)
    }

    /// Flags and mode that guard the admin routes
    pub fn operators() -> Self {
        Self::any([UserFlag::Administrator, UserFlag::SystemOperator])
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// An empty requirement is satisfied by anyone
    pub fn check(&self, held: &FlagSet) -> Result<(), DomainError> {
        if self.flags.is_empty() {
            return Ok(());
        }

        let satisfied = match self.mode {
            MatchMode::All => self.flags.iter().all(|f| held.contains(f)),
            MatchMode::Any => self.flags.iter().any(|f| held.contains(f)),
        };

        if satisfied {
            Ok(())
        } else {
            Err(DomainError::permission_denied(format!(
                "This endpoint requires {} of these flags: {}",
                self.mode.as_str(),
                self.flags
            )))
        }
    }
}

/// Reject callers whose resolved flags miss the requirement
///
/// Must run inside the access gate; a request without a resolved caller is
/// denied.
pub async fn require_flags(
    State(requirement): State<FlagRequirement>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let held = request
        .extensions()
        .get::<ResolvedAccess>()
        .map(|access| access.flags.clone())
        .unwrap_or_default();

    if let Err(e) = requirement.check(&held) {
        info!(
            path = %request.uri().path(),
            held = %held,
            required = %requirement.flags,
            "Request denied by flag requirement"
        );
        return ApiError::from(e).into_response();
    }

    next.run(request).await
}
