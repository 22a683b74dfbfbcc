// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::filter::QueryError;

/// HTTP API error with a status code and a client-safe message
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 400 as well: duplicate unique key
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Convert to JSON response body: `{status, message}`
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "status": self.status_code(),
            "message": self.message(),
        });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }
        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidIdentifier(name) => {
                // Identifiers come from code, never from clients
                tracing::error!("Rejected identifier in generated SQL: {}", name);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            other => ApiError::validation_error(other.to_string(), None),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::UniqueViolation(constraint) => {
                tracing::warn!("Unique constraint violated: {}", constraint);
                ApiError::conflict("A record with the same unique value already exists")
            }
            DatabaseError::IntegrityViolation(msg) => ApiError::bad_request(msg),
            DatabaseError::Query(e) => e.into(),
            DatabaseError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::ConfigMissing(key) => {
                tracing::error!("Missing configuration: {}", key);
                ApiError::internal_server_error("Service is not configured")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => ApiError::unauthorized(err.to_string()),
            AuthError::Configuration | AuthError::TokenGeneration(_) => {
                tracing::error!("Token service failure: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Terminal mapping for every error that reaches axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Number;

    #[test]
    fn body_carries_status_and_message() {
        let err = ApiError::not_found("No such company: hooli");
        assert_eq!(
            err.to_json(),
            json!({"status": 404, "message": "No such company: hooli"})
        );
    }

    #[test]
    fn oversized_body_is_413() {
        let err = ApiError::payload_too_large("Request body too large");
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.to_json(), json!({"status": 413, "message": "Request body too large"}));
    }

    #[test]
    fn query_errors_are_client_errors() {
        let err: ApiError = QueryError::EmptyUpdate.into();
        assert_eq!(err.status_code(), 400);

        let err: ApiError = QueryError::InvalidRange {
            criterion: "employees".into(),
            min: Number::from(15),
            max: Number::from(10),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("employees"));
    }

    #[test]
    fn duplicates_map_to_400() {
        let err: ApiError = DatabaseError::UniqueViolation("users_pkey".into()).into();
        assert_eq!(err.status_code(), 400);
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let err: ApiError = DatabaseError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Database error occurred");

        let hashing = crate::auth::password::PasswordError::Task("cancelled".into());
        let err: ApiError = DatabaseError::Password(hashing).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("cancelled"));
    }

    #[test]
    fn auth_errors_map_to_401_or_500() {
        let missing: ApiError = AuthError::MissingToken.into();
        assert_eq!(missing, ApiError::unauthorized("no token"));
        let invalid: ApiError = AuthError::InvalidToken.into();
        assert_eq!(invalid, ApiError::unauthorized("invalid token"));
        let config: ApiError = AuthError::Configuration.into();
        assert_eq!(config.status_code(), 500);
    }
}
