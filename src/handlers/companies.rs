use axum::extract::{rejection::QueryRejection, Path, Query, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::NewCompany;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CompanySearch;

use super::validation::{CompanyPatch, ValidatedJson};

/// GET /companies - `{companies: [{handle, name}]}`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<CompanySearch>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(search) = query.map_err(|e| ApiError::validation_error(e.body_text(), None))?;
    let companies = state.companies.list(&search).await?;
    Ok(ApiResponse::success(json!({ "companies": companies })))
}

/// GET /companies/:handle - `{company}`
pub async fn get(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    let company = state.companies.get(&handle).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// POST /companies - 201 `{company}`
pub async fn post(
    State(state): State<AppState>,
    ValidatedJson(data): ValidatedJson<NewCompany>,
) -> ApiResult<Value> {
    let company = state.companies.create(&data).await?;
    Ok(ApiResponse::created(json!({ "company": company })))
}

/// PATCH /companies/:handle - `{company}`
pub async fn patch(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    ValidatedJson(patch): ValidatedJson<CompanyPatch>,
) -> ApiResult<Value> {
    let company = state.companies.update(&handle, &patch.to_fields()?).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// DELETE /companies/:handle
pub async fn delete(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    state.companies.remove(&handle).await?;
    Ok(ApiResponse::success(json!({ "message": "Company deleted" })))
}
