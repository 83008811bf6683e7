use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::{ApiError, StatusResponse};
use crate::publish::{Credentials, DeployOutcome, Publisher};

fn publisher(state: &AppState) -> Publisher<'_> {
    Publisher::new(
        state.vcs.as_ref(),
        &state.config.site_dir,
        &state.config.publish,
    )
}

/// `POST /api/deploy`: commit the site and push it.
pub async fn deploy(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse<DeployOutcome>>, ApiError> {
    let _job = state.try_start_job()?;
    let outcome = publisher(&state).deploy().await?;
    Ok(Json(StatusResponse::with_details(outcome.message.clone(), outcome)))
}

/// `POST /api/sync`: pull remote changes.
pub async fn sync(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let _job = state.try_start_job()?;
    let message = publisher(&state).sync().await?;
    Ok(Json(StatusResponse::success(message)))
}

/// `POST /api/connect`: configure the repository and its `origin`.
pub async fn connect(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let credentials: Credentials = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))?;

    let _job = state.try_start_job()?;
    let message = publisher(&state).connect(&credentials).await?;
    Ok(Json(StatusResponse::success(message)))
}
