//! Admin API endpoints for managing API keys

pub mod api_keys;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use super::middleware::{require_flags, FlagRequirement};
use super::state::AppState;

/// Create admin API router
///
/// Every route requires an operator flag; the caller must already be
/// resolved by the access gate.
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::issue_api_key),
        )
        .route("/api-keys/{key}", delete(api_keys::revoke_api_key))
        .route_layer(middleware::from_fn_with_state(
            FlagRequirement::operators(),
            require_flags,
        ))
}
