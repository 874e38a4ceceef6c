//! Code registration, redemption, and purge endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, error_response};
use crate::auth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddCodeRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    ttl_seconds: Option<u64>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Serialize)]
pub struct AddCodeResponse {
    status: &'static str,
    code: String,
    expires_at: String,
}

/// Register a code (admin)
pub async fn add_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddCodeRequest>,
) -> Result<Json<AddCodeResponse>, ApiError> {
    if !auth::admin_authorized(&headers, &state.config.admin_api_key) {
        return Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    let code = payload.code.as_deref().unwrap_or("").trim().to_string();
    if code.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "missing_code"));
    }

    let ttl_secs = payload.ttl_seconds.unwrap_or(state.config.default_ttl_secs);
    if ttl_secs == 0 || ttl_secs > state.config.max_ttl_secs {
        return Err(error_response(StatusCode::BAD_REQUEST, "invalid_ttl"));
    }

    let metadata = payload
        .metadata
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let expires_at = state
        .store
        .add(&code, ttl_secs, metadata)
        .await
        .map_err(|e| {
            tracing::error!(code = %code, error = %e, "Failed to register code");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        })?;

    Ok(Json(AddCodeResponse {
        status: "added",
        code,
        expires_at: format_expiry(expires_at),
    }))
}

#[derive(Deserialize)]
pub struct CheckCodeQuery {
    code: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckCodeBody {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
pub struct CheckCodeResponse {
    status: &'static str,
    code: String,
    metadata: Value,
}

/// Redeem a code (public). Accepts the code via query parameter or JSON
/// body; the query parameter wins when both are present.
pub async fn check_code(
    State(state): State<AppState>,
    Query(params): Query<CheckCodeQuery>,
    body: Option<Json<CheckCodeBody>>,
) -> Result<Json<CheckCodeResponse>, ApiError> {
    let code = params
        .code
        .or_else(|| body.and_then(|Json(b)| b.code))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if code.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "missing_code"));
    }

    match state
        .store
        .check_and_consume(&code, state.config.allow_reuse)
        .await
    {
        Ok(record) => Ok(Json(CheckCodeResponse {
            status: "ok",
            code,
            metadata: record.metadata,
        })),
        Err(e) if e.is_denial() => {
            // Collapsed on purpose: the response never says which of
            // not-found / expired / already-used it was
            tracing::debug!(code = %code, reason = %e, "Redemption denied");
            Err(error_response(StatusCode::NOT_FOUND, "invalid_or_expired"))
        }
        Err(e) => {
            tracing::error!(code = %code, error = %e, "Redemption failed on storage");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ))
        }
    }
}

#[derive(Serialize)]
pub struct PurgeResponse {
    status: &'static str,
    removed: u64,
}

/// Remove dead records (admin)
pub async fn purge_codes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PurgeResponse>, ApiError> {
    if !auth::admin_authorized(&headers, &state.config.admin_api_key) {
        return Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized"));
    }

    let removed = state.store.purge().await.map_err(|e| {
        tracing::error!(error = %e, "Purge failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
    })?;

    tracing::info!(removed, "Purge completed");

    Ok(Json(PurgeResponse {
        status: "purged",
        removed,
    }))
}

fn format_expiry(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}
