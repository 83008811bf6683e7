use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{ApiError, StatusResponse};

/// Pretty-print with four-space indentation, the layout the panel reads back.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Write through a sibling temp file so readers never see half a config.
async fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

/// `POST /api/save_config`: replace `config.json` with the posted object.
pub async fn save_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ApiError::BadRequest(
            "Config must be a JSON object".to_string(),
        ));
    }

    let contents = to_pretty_json(&value).map_err(|e| ApiError::Internal(e.to_string()))?;
    let path = state.config.site_config_path();
    replace_file(&path, &contents)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

    info!("Saved site config to {}", path.display());
    Ok(Json(StatusResponse::success("Config saved successfully.")))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::tests::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_save_config_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let config = json!({
            "site_settings": {"target_country": "UK"},
            "sport_priorities": {"UK": {"Premier League": {"score": 100}}}
        });

        let (status, body) = post_json(app, "/api/save_config", &config.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let written = std::fs::read_to_string(dir.path().join("data/config.json")).unwrap();
        assert!(written.starts_with("{\n    \"site_settings\""));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, config);
        assert!(!dir.path().join("data/config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_config_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let body = r#"{"sport_priorities": {"US": {"NFL": {}, "MLB": {}, "NBA": {}}}}"#;

        let (status, _) = post_json(app, "/api/save_config", body).await;

        assert_eq!(status, StatusCode::OK);
        let written = std::fs::read_to_string(dir.path().join("data/config.json")).unwrap();
        let nfl = written.find("NFL").unwrap();
        let mlb = written.find("MLB").unwrap();
        let nba = written.find("NBA").unwrap();
        assert!(nfl < mlb && mlb < nba);
    }

    #[tokio::test]
    async fn test_save_config_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));

        let (status, body) = post_json(app, "/api/save_config", "[1, 2]").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(!dir.path().join("data/config.json").exists());
    }

    #[tokio::test]
    async fn test_save_config_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));

        let (status, body) = post_json(app, "/api/save_config", "{ nope").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
