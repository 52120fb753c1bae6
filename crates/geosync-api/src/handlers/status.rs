//! Aggregated status handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::dto::response::StatusResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/status
///
/// Serves the cached snapshot when fresh; on a miss this call blocks for
/// the duration of the probes (up to the configured poll ceiling).
/// Responds 200 when every probe passes and 503 otherwise; a `slow`
/// classification is informational and does not fail the check.
pub async fn get_status(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.status.get_status().await?;
    let code = if snapshot.overall_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((code, Json(StatusResponse::from(snapshot))).into_response())
}
