use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::validation::{LoginRequest, ValidatedJson};

/// POST /login - exchange credentials for a token
pub async fn post(State(state): State<AppState>, ValidatedJson(creds): ValidatedJson<LoginRequest>) -> ApiResult<Value> {
    let Some(user) = state.users.authenticate(&creds.username, &creds.password).await? else {
        tracing::info!("Failed login for '{}'", creds.username);
        return Err(ApiError::unauthorized("Invalid username/password"));
    };

    let token = state
        .tokens
        .issue(&Principal::new(user.username, user.is_admin))?;
    Ok(ApiResponse::success(json!({ "token": token })))
}
