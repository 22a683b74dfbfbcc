use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::NewJob;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::JobSearch;

use super::validation::{ApplyRequest, JobPatch, ValidatedJson};

fn job_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation_error("Job id must be an integer", None))
}

/// GET /jobs - `{jobs: [{id, title, company_handle}]}`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<JobSearch>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(search) = query.map_err(|e| ApiError::validation_error(e.body_text(), None))?;
    let jobs = state.jobs.list(&search).await?;
    Ok(ApiResponse::success(json!({ "jobs": jobs })))
}

/// GET /jobs/:id - `{job: {..., company}}`
pub async fn get(State(state): State<AppState>, path: Result<Path<i32>, PathRejection>) -> ApiResult<Value> {
    let job = state.jobs.get(job_id(path)?).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

/// POST /jobs - 201 `{job}`
pub async fn post(State(state): State<AppState>, ValidatedJson(data): ValidatedJson<NewJob>) -> ApiResult<Value> {
    let job = state.jobs.create(&data).await?;
    Ok(ApiResponse::created(json!({ "job": job })))
}

/// PATCH /jobs/:id - `{job}`
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    ValidatedJson(patch): ValidatedJson<JobPatch>,
) -> ApiResult<Value> {
    let job = state.jobs.update(job_id(path)?, &patch.to_fields()?).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

/// DELETE /jobs/:id
pub async fn delete(State(state): State<AppState>, path: Result<Path<i32>, PathRejection>) -> ApiResult<Value> {
    state.jobs.remove(job_id(path)?).await?;
    Ok(ApiResponse::success(json!({ "message": "Job deleted" })))
}

/// POST /jobs/:id/apply - `{message: state}` for the calling user
pub async fn apply(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i32>, PathRejection>,
    body: Option<Json<ApplyRequest>>,
) -> ApiResult<Value> {
    let id = job_id(path)?;
    let requested = body.and_then(|Json(req)| req.state);
    let application = state
        .jobs
        .apply(id, &principal.subject_id, requested.as_deref())
        .await?;
    Ok(ApiResponse::success(json!({ "message": application.state })))
}
