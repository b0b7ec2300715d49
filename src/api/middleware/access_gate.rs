//! Per-request access gate
//!
//! Extracts the `X-API-Key` header, resolves the caller's flags and policy,
//! counts the request against its window and either rejects it with 429 or
//! passes it on with a [`ResolvedAccess`] in the request extensions.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::rate_limit::RateLimitDecision;
use crate::infrastructure::api_key::{fingerprint_key, redact_namespaced};
use crate::infrastructure::rate_limit::ResolvedAccess;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Gate every request through key resolution and rate limiting
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let api_key = extract_api_key(request.headers());
    let access = state.resolver.resolve_access(api_key.as_deref()).await;

    let identity = match &access.api_key {
        Some(key) => format!("key:{}", fingerprint_key(key)),
        None => client_identity(&request, state.trusted_proxy_hops),
    };

    let decision = state.limiter.check(&identity, &access.policy).await;

    if let Err(e) = decision.into_result() {
        info!(
            identity = %redact_namespaced(&identity),
            owner_id = ?access.owner_id,
            quota = %decision.quota,
            reset_in_seconds = decision.reset_in_seconds,
            "Request rejected by rate limit"
        );

        let mut response = ApiError::from(e).into_response();
        apply_rate_limit_headers(response.headers_mut(), &decision);
        return response;
    }

    request.extensions_mut().insert(access);

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

/// The trimmed `X-API-Key` value; missing, empty or non-UTF-8 is no key
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(API_KEY_HEADER)?;

    match value.to_str() {
        Ok(key) => Some(key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_string),
        Err(_) => {
            warn!("Ignoring X-API-Key header with invalid encoding");
            None
        }
    }
}

/// Source address identity for callers without a valid key
///
/// With `trusted_hops` proxies in front, the address is the entry those
/// proxies appended for their client, counted from the right of
/// `X-Forwarded-For`. Entries further left are caller supplied and never
/// used. Without trusted proxies only the socket peer counts.
fn client_identity(request: &Request<Body>, trusted_hops: usize) -> String {
    if trusted_hops > 0 {
        if let Some(hop) = forwarded_client(request.headers(), trusted_hops) {
            return format!("ip:{}", hop);
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

fn forwarded_client(headers: &HeaderMap, trusted_hops: usize) -> Option<String> {
    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();

    // Fewer entries than proxies: every entry came from a trusted hop
    let index = hops.len().saturating_sub(trusted_hops);

    hops.get(index)
        .filter(|hop| !hop.is_empty())
        .map(|hop| hop.to_string())
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let (Some(limit), Some(remaining)) = (decision.quota.limit(), decision.remaining) else {
        return;
    };

    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(
        RATE_LIMIT_RESET,
        HeaderValue::from(decision.reset_in_seconds),
    );
}

/// Handlers behind the gate can take the resolved caller as an argument
impl<S> FromRequestParts<S> for ResolvedAccess
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedAccess>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Route is not behind the access gate"))
    }
}
