use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::admin;
use super::handlers;
use super::health;
use super::middleware::{access_gate, logging_middleware};
use super::state::AppState;

/// Create the full router with application state
///
/// Probes are served outside the access gate; everything else is counted
/// against the caller's quota before it reaches a handler.
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/", get(handlers::welcome))
        .route("/echo", post(handlers::echo))
        .route("/format-number", post(handlers::format_number))
        .route("/unformat-number", post(handlers::unformat_number))
        .route("/webhook", post(handlers::webhook))
        .nest("/admin", admin::create_admin_router())
        .layer(middleware::from_fn_with_state(state.clone(), access_gate));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(gated)
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
