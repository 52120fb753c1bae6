//! Delta submission and apply handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use geosync_core::error::AppError;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::delta::{CreateDelta, DeltaChange};

use crate::dto::request::{ApplyDeltasRequest, SubmitDeltaRequest};
use crate::dto::response::{ApiResponse, DeltaResponse, JobResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/projects/{id}/deltas
pub async fn submit_delta(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<SubmitDeltaRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeltaResponse>>), ApiError> {
    // Reject malformed change lists at the boundary rather than at apply
    // time, so the submitting client sees the error.
    let changes: Vec<DeltaChange> = serde_json::from_value(body.changes.clone())
        .map_err(|e| AppError::validation(format!("Malformed change list: {e}")))?;
    if changes.is_empty() {
        return Err(AppError::validation("Change list must not be empty").into());
    }

    let delta = state
        .deltas
        .create(&CreateDelta {
            project_id,
            content: body.changes,
            created_by: body.submitted_by,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DeltaResponse::from(delta))),
    ))
}

/// GET /api/projects/{id}/deltas
pub async fn list_project_deltas(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<DeltaResponse>>>, ApiError> {
    let deltas = state.deltas.list_by_project(project_id, &page).await?;
    let items = deltas.items.into_iter().map(DeltaResponse::from).collect();
    let response = PageResponse {
        items,
        page: deltas.page,
        page_size: deltas.page_size,
        total_items: deltas.total_items,
        total_pages: deltas.total_pages,
    };
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/projects/{id}/deltas/apply
///
/// Responds 201 with the apply job (new or already in flight), or 204
/// when there are no pending deltas to apply.
pub async fn apply_deltas(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ApplyDeltasRequest>,
) -> Result<Response, ApiError> {
    let job = state
        .coordinator
        .apply_deltas(
            project_id,
            body.requested_by,
            body.overwrite_conflicts,
            body.delta_ids,
        )
        .await?;

    match job {
        Some(job) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(JobResponse::from(job))),
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
