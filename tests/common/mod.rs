//! Shared harness for driving the router with in-memory backends

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use keygate::api::create_router;
use keygate::api::state::AppState;
use keygate::domain::{DomainError, ManualClock, PrincipalDocument, PrincipalStore, UserFlag};
use keygate::infrastructure::cache::InMemoryCache;
use keygate::infrastructure::principal::InMemoryPrincipalStore;
use keygate::{build_app_state, AppConfig};

/// Aligned to a 60 second window boundary
pub const START_SECS: i64 = 1_700_000_040;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub principals: Arc<InMemoryPrincipalStore>,
    pub cache: Arc<InMemoryCache>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let principals = Arc::new(InMemoryPrincipalStore::new());
        Self::build(&config, principals.clone(), principals)
    }

    /// App reading flags from `store`; `principals` is then unused
    pub fn with_principal_store(store: Arc<dyn PrincipalStore>) -> Self {
        Self::build(
            &AppConfig::default(),
            store,
            Arc::new(InMemoryPrincipalStore::new()),
        )
    }

    fn build(
        config: &AppConfig,
        store: Arc<dyn PrincipalStore>,
        principals: Arc<InMemoryPrincipalStore>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(START_SECS));
        let cache = Arc::new(InMemoryCache::new());

        let state = build_app_state(config, cache.clone(), store, clock.clone()).unwrap();

        Self {
            router: create_router(state.clone()),
            state,
            clock,
            principals,
            cache,
        }
    }

    /// Register a principal and issue a key for it
    pub async fn key_for(&self, owner_id: &str, flags: &[UserFlag]) -> String {
        self.principals
            .insert(
                owner_id,
                PrincipalDocument::new(format!("{}@example.com", owner_id), flags),
            )
            .await;

        self.state.api_keys.issue(owner_id, None).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn echo(&self, api_key: Option<&str>) -> TestResponse {
        self.send(echo_request(api_key)).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

pub fn echo_request(api_key: Option<&str>) -> Request<Body> {
    json_request(Method::POST, "/echo", api_key, serde_json::json!({"content": "hi"}))
}

/// Anonymous echo carrying an `X-Forwarded-For` header
pub fn forwarded_echo(forwarded_for: &str) -> Request<Body> {
    let mut request = echo_request(None);
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

pub fn json_request(
    method: Method,
    uri: &str,
    api_key: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    builder.body(Body::empty()).unwrap()
}

/// Principal store whose every read fails
#[derive(Debug)]
pub struct UnreachablePrincipalStore;

#[async_trait]
impl PrincipalStore for UnreachablePrincipalStore {
    async fn get(&self, _owner_id: &str) -> Result<Option<PrincipalDocument>, DomainError> {
        Err(DomainError::unavailable("connection refused"))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Err(DomainError::unavailable("connection refused"))
    }
}
