use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::NewUser;
use crate::middleware::{ApiResponse, ApiResult};

use super::validation::{UserPatch, ValidatedJson};

/// GET /users - `{users: [{username, first_name, last_name, email}]}`
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.users.list().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// GET /users/:username - `{user: {..., jobs}}`
pub async fn get(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    let user = state.users.get(&username).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// POST /users - register and return a token for the new account
pub async fn post(State(state): State<AppState>, ValidatedJson(data): ValidatedJson<NewUser>) -> ApiResult<Value> {
    let user = state.users.register(&data).await?;
    let token = state
        .tokens
        .issue(&Principal::new(user.username, user.is_admin))?;
    Ok(ApiResponse::created(json!({ "token": token })))
}

/// PATCH /users/:username - owner only; never returns password or is_admin
pub async fn patch(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(patch): ValidatedJson<UserPatch>,
) -> ApiResult<Value> {
    let user = state.users.update(&username, &patch.to_fields()?).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// DELETE /users/:username - owner only
pub async fn delete(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    state.users.remove(&username).await?;
    Ok(ApiResponse::success(json!({ "message": "User deleted" })))
}
