//! API key management admin endpoints

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::api_key::ApiKeyRecord;
use crate::infrastructure::api_key::redact_key;
use crate::infrastructure::rate_limit::ResolvedAccess;

/// Request to issue a new API key
#[derive(Debug, Clone, Deserialize)]
pub struct IssueApiKeyRequest {
    pub owner_id: String,
    #[serde(default)]
    pub ttl_days: Option<u32>,
}

/// Issued key, returned only once
#[derive(Debug, Clone, Serialize)]
pub struct IssueApiKeyResponse {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeApiKeyResponse {
    pub revoked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListApiKeysQuery {
    pub owner_id: String,
}

/// API key record in response format
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub key: String,
    pub owner_id: String,
    pub issued_at: String,
    pub expires_at: String,
}

impl From<&ApiKeyRecord> for ApiKeyResponse {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            key: record.key().to_string(),
            owner_id: record.owner_id().to_string(),
            issued_at: to_rfc3339(record.issued_at()),
            expires_at: to_rfc3339(record.expires_at()),
        }
    }
}

fn to_rfc3339(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// List API keys response
#[derive(Debug, Clone, Serialize)]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKeyResponse>,
    pub total: usize,
}

/// POST /admin/api-keys
pub async fn issue_api_key(
    State(state): State<AppState>,
    caller: ResolvedAccess,
    Json(request): Json<IssueApiKeyRequest>,
) -> Result<Json<IssueApiKeyResponse>, ApiError> {
    let key = state
        .api_keys
        .issue(&request.owner_id, request.ttl_days)
        .await
        .map_err(ApiError::from)?;

    info!(
        owner_id = %request.owner_id,
        issued_by = ?caller.owner_id,
        key = %redact_key(&key),
        "Admin issued API key"
    );

    Ok(Json(IssueApiKeyResponse { key }))
}

/// DELETE /admin/api-keys/{key}
pub async fn revoke_api_key(
    State(state): State<AppState>,
    caller: ResolvedAccess,
    Path(key): Path<String>,
) -> Result<Json<RevokeApiKeyResponse>, ApiError> {
    state.api_keys.revoke(&key).await.map_err(ApiError::from)?;

    info!(
        key = %redact_key(&key),
        revoked_by = ?caller.owner_id,
        "Admin revoked API key"
    );

    Ok(Json(RevokeApiKeyResponse { revoked: true }))
}

/// GET /admin/api-keys?owner_id=
pub async fn list_api_keys(
    State(state): State<AppState>,
    Query(query): Query<ListApiKeysQuery>,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    let records = state
        .api_keys
        .list_for_owner(&query.owner_id)
        .await
        .map_err(ApiError::from)?;

    let api_keys: Vec<ApiKeyResponse> = records.iter().map(ApiKeyResponse::from).collect();
    let total = api_keys.len();

    Ok(Json(ListApiKeysResponse { api_keys, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_request_minimal() {
        let request: IssueApiKeyRequest = serde_json::from_str(r#"{"owner_id": "u1"}"#).unwrap();

        assert_eq!(request.owner_id, "u1");
        assert!(request.ttl_days.is_none());
    }

    #[test]
    fn test_issue_request_with_ttl() {
        let request: IssueApiKeyRequest =
            serde_json::from_str(r#"{"owner_id": "u1", "ttl_days": 7}"#).unwrap();

        assert_eq!(request.ttl_days, Some(7));
    }

    #[test]
    fn test_issue_request_rejects_negative_ttl() {
        let result = serde_json::from_str::<IssueApiKeyRequest>(r#"{"owner_id": "u1", "ttl_days": -1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_response() {
        let record = ApiKeyRecord::from_parts("key_abc", "u1", 0, 86_400);
        let response = ApiKeyResponse::from(&record);

        assert_eq!(response.key, "key_abc");
        assert_eq!(response.owner_id, "u1");
        assert_eq!(response.issued_at, "1970-01-01T00:00:00+00:00");
        assert_eq!(response.expires_at, "1970-01-02T00:00:00+00:00");
    }
}
