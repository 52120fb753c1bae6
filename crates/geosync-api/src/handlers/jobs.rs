//! Job submission, polling, and cancellation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use geosync_core::error::AppError;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::job::{CreateJob, JobType};

use crate::dto::request::SubmitJobRequest;
use crate::dto::response::{ApiResponse, JobResponse, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/jobs
///
/// Accepts the directly-submittable job types. Delta apply jobs are
/// created through the deltas endpoint so admission control cannot be
/// bypassed, and ping jobs are internal to the status aggregator.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(body): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobResponse>>), ApiError> {
    let job_type: JobType = body.job_type.parse()?;
    match job_type {
        JobType::Export | JobType::ProcessProjectFile => {}
        other => {
            return Err(AppError::validation(format!(
                "Job type '{other}' cannot be submitted directly"
            ))
            .into());
        }
    }

    let job = state
        .dispatcher
        .submit(CreateJob {
            job_type,
            project_id: Some(body.project_id),
            payload: body.payload.unwrap_or(serde_json::Value::Null),
            created_by: body.requested_by,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(JobResponse::from(job))),
    ))
}

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job = state
        .jobs
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))?;
    Ok(Json(ApiResponse::ok(JobResponse::from(job))))
}

/// POST /api/jobs/{id}/cancel
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .jobs
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))?;

    let stopped = state.jobs.mark_stopped(id).await?;
    if !stopped {
        return Err(AppError::conflict("Only pending or queued jobs can be stopped").into());
    }
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Job stopped".to_string(),
    })))
}

/// GET /api/projects/{id}/jobs
pub async fn list_project_jobs(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<JobResponse>>>, ApiError> {
    let jobs = state.jobs.list_by_project(project_id, &page).await?;
    let items = jobs.items.into_iter().map(JobResponse::from).collect();
    let response = PageResponse {
        items,
        page: jobs.page,
        page_size: jobs.page_size,
        total_items: jobs.total_items,
        total_pages: jobs.total_pages,
    };
    Ok(Json(ApiResponse::ok(response)))
}
