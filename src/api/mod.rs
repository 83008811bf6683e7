//! Admin HTTP server.
//!
//! A small axum app for the local admin panel: it saves the site config,
//! runs builds, and publishes the site with git. Every other path is served
//! from the site directory with caching disabled, so the panel always
//! previews the latest build.

pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::build::BuildError;
use crate::publish::PublishError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<PublishError> for ApiError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::MissingField(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            status: "error",
            code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Success response body. `details` carries the operation's result, if any.
#[derive(Debug, Serialize)]
pub struct StatusResponse<T = ()> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<T>,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            details: None,
        }
    }
}

impl<T> StatusResponse<T> {
    pub fn with_details(message: impl Into<String>, details: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            details: Some(details),
        }
    }
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("API endpoint not found".to_string())
}

/// The full admin app: API routes plus the static site.
pub fn build_router(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.site_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/save_config", post(routes::config::save_config))
        .route("/api/build", post(routes::build::build))
        .route("/api/deploy", post(routes::publish::deploy))
        .route("/api/sync", post(routes::publish::sync))
        .route("/api/connect", post(routes::publish::connect))
        .route("/api/*rest", any(api_not_found))
        .fallback_service(site)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::util::ServiceExt;

    async fn into_json(resp: Response) -> (StatusCode, Value) {
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, json) = into_json(ApiError::Conflict("busy".into()).into_response()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["message"], "Conflict: busy");
    }

    #[test]
    fn test_publish_error_mapping() {
        let bad = ApiError::from(PublishError::MissingField("repo"));
        assert!(matches!(bad, ApiError::BadRequest(_)));
        let internal = ApiError::from(PublishError::GitNotFound);
        assert!(matches!(internal, ApiError::Internal(_)));
    }

    #[test]
    fn test_success_body_omits_empty_details() {
        let json = serde_json::to_value(StatusResponse::success("Saved")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success", "message": "Saved"}));

        let json = serde_json::to_value(StatusResponse::with_details("Built", 3)).unwrap();
        assert_eq!(json["details"], 3);
    }

    #[tokio::test]
    async fn test_static_files_are_served_uncached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        let app = build_router(state::tests::test_state(dir.path()));

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Home</h1>");
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state::tests::test_state(dir.path()));

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, json) = into_json(resp).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
