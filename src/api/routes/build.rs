use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::{ApiError, StatusResponse};
use crate::build::{BuildReport, Builder};

/// `POST /api/build`: run one full build and return its report.
pub async fn build(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse<BuildReport>>, ApiError> {
    let _job = state.try_start_job()?;

    let report = Builder::new(&state.config, state.feed.as_ref()).run().await?;
    let message = format!(
        "Built {} pages from {} matches.",
        report.pages.len(),
        report.records
    );
    Ok(Json(StatusResponse::with_details(message, report)))
}
