//! HTTP route handlers for Turnstile.

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

mod codes;
mod health;

/// Uniform JSON error reply: status code plus `{status, error}` body
pub type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Serialize)]
pub struct ErrorBody {
    status: &'static str,
    error: &'static str,
}

pub fn error_response(status: StatusCode, kind: &'static str) -> ApiError {
    (
        status,
        Json(ErrorBody {
            status: "error",
            error: kind,
        }),
    )
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public surface
        .route("/", get(index))
        .route("/health", get(health::health_check))
        .route("/checkcode", get(codes::check_code).post(codes::check_code))

        // Admin surface (shared-secret header)
        .route("/addcode", post(codes::add_code))
        .route("/purge", post(codes::purge_codes))

        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct IndexResponse {
    message: &'static str,
    endpoints: [&'static str; 4],
}

async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "API running",
        endpoints: ["/health", "/addcode", "/checkcode", "/purge"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use turnkey_common::constants::headers::X_API_KEY;

    const ADMIN_KEY: &str = "test-admin-key";

    async fn test_router() -> Router {
        let config = AppConfig {
            admin_api_key: ADMIN_KEY.to_string(),
            ..Default::default()
        };
        create_router(AppState::new(config).await.unwrap())
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn add_request(key: Option<&str>, payload: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/addcode")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(X_API_KEY, key);
        }
        builder.body(Body::from(payload.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_ok_and_time() {
        let router = test_router().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["time"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_add_requires_admin_key() {
        let router = test_router().await;
        let payload = json!({"code": "ABC123"});

        let (status, body) = send(&router, add_request(None, payload.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = send(&router, add_request(Some("wrong"), payload)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_admin_key_fails_closed() {
        let config = AppConfig::default(); // no admin key configured
        let router = create_router(AppState::new(config).await.unwrap());

        let (status, _) = send(&router, add_request(Some(""), json!({"code": "A"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_then_check_roundtrip() {
        let router = test_router().await;
        let payload = json!({"code": "ABC123", "ttl_seconds": 60, "metadata": {"user": "alice"}});

        let (status, body) = send(&router, add_request(Some(ADMIN_KEY), payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "added");
        assert_eq!(body["code"], "ABC123");
        assert!(body["expires_at"].as_str().unwrap().contains('T'));

        let request = Request::builder()
            .uri("/checkcode?code=ABC123")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["metadata"], json!({"user": "alice"}));

        // Second redemption: collapsed invalid_or_expired, never the reason
        let request = Request::builder()
            .uri("/checkcode?code=ABC123")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "invalid_or_expired");
    }

    #[tokio::test]
    async fn test_check_accepts_code_in_post_body() {
        let router = test_router().await;
        send(&router, add_request(Some(ADMIN_KEY), json!({"code": "BODY1"}))).await;

        let request = Request::builder()
            .method("POST")
            .uri("/checkcode")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"code": "BODY1"}).to_string()))
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "BODY1");
    }

    #[tokio::test]
    async fn test_unknown_code_is_invalid_or_expired() {
        let router = test_router().await;
        let request = Request::builder()
            .uri("/checkcode?code=NEVER_ADDED")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "invalid_or_expired");
    }

    #[tokio::test]
    async fn test_missing_code_is_rejected() {
        let router = test_router().await;

        let (status, body) = send(&router, add_request(Some(ADMIN_KEY), json!({"code": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_code");

        let request = Request::builder()
            .uri("/checkcode")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_code");
    }

    #[tokio::test]
    async fn test_out_of_bounds_ttl_is_rejected() {
        let router = test_router().await;

        for ttl in [0u64, 999_999] {
            let payload = json!({"code": "TTL", "ttl_seconds": ttl});
            let (status, body) = send(&router, add_request(Some(ADMIN_KEY), payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "invalid_ttl");
        }
    }

    #[tokio::test]
    async fn test_purge_reports_removed_count() {
        let router = test_router().await;

        send(&router, add_request(Some(ADMIN_KEY), json!({"code": "GONE"}))).await;
        let request = Request::builder()
            .uri("/checkcode?code=GONE")
            .body(Body::empty())
            .unwrap();
        send(&router, request).await;

        let request = Request::builder()
            .method("POST")
            .uri("/purge")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method("POST")
            .uri("/purge")
            .header(X_API_KEY, ADMIN_KEY)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "purged");
        assert_eq!(body["removed"], 1);
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let router = test_router().await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(&router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .contains(&json!("/checkcode")));
    }
}
