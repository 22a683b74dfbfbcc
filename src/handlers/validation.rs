use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::database::models::{NewCompany, NewJob, NewUser};
use crate::error::ApiError;
use crate::filter::FieldMap;
use crate::middleware::TOKEN_FIELD;

/// Body-level checks run after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// JSON body extractor that drops a stray `_token` field, deserializes into
/// `T` and runs [`Validate::validate`]. Every failure is a 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::validation_error(rejection.body_text(), None))?;

        if let Some(obj) = body.as_object_mut() {
            obj.remove(TOKEN_FIELD);
        }

        let value: T = serde_json::from_value(body)
            .map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e), None))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Collects per-field messages and turns them into one validation error
#[derive(Debug, Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.0.entry(field.to_string()).or_insert(message);
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

fn require_text(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(())
    }
}

fn validate_handle(handle: &str) -> Result<(), String> {
    require_text(handle)?;
    if !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err("may only contain letters, numbers, underscore, and hyphen".to_string());
    }
    Ok(())
}

fn validate_non_negative(value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err("must be a non-negative number".to_string()),
        _ => Ok(()),
    }
}

fn validate_equity(value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err("must be between 0 and 1".to_string()),
        _ => Ok(()),
    }
}

fn validate_employees(value: Option<i32>) -> Result<(), String> {
    match value {
        Some(n) if n < 0 => Err("must not be negative".to_string()),
        _ => Ok(()),
    }
}

pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > 50 {
        return Err("Username must be less than 50 characters".to_string());
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err("Username can only contain letters, numbers, underscore, and hyphen".to_string());
    }
    if !username.chars().next().map(char::is_alphanumeric).unwrap_or(false) {
        return Err("Username must start with a letter or number".to_string());
    }
    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}

fn serialize_fields<T: Serialize>(patch: &T) -> Result<FieldMap, ApiError> {
    match serde_json::to_value(patch) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::internal_server_error("Failed to read update fields")),
    }
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.check("handle", validate_handle(&self.handle));
        errors.check("name", require_text(&self.name));
        errors.check("num_employees", validate_employees(self.num_employees));
        errors.finish()
    }
}

/// PATCH /companies/:handle body; the handle itself is not updatable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_employees: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl CompanyPatch {
    pub fn to_fields(&self) -> Result<FieldMap, ApiError> {
        serialize_fields(self)
    }
}

impl Validate for CompanyPatch {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        if let Some(name) = &self.name {
            errors.check("name", require_text(name));
        }
        errors.check("num_employees", validate_employees(self.num_employees));
        errors.finish()
    }
}

impl Validate for NewJob {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.check("title", require_text(&self.title));
        errors.check("company_handle", require_text(&self.company_handle));
        errors.check("salary", validate_non_negative(self.salary));
        errors.check("equity", validate_equity(self.equity));
        errors.finish()
    }
}

/// PATCH /jobs/:id body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobPatch {
    /// Only present so that an attempted id change gets a precise message
    #[serde(default, skip_serializing)]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_handle: Option<String>,
}

impl JobPatch {
    pub fn to_fields(&self) -> Result<FieldMap, ApiError> {
        serialize_fields(self)
    }
}

impl Validate for JobPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if self.id.is_some() {
            return Err(ApiError::bad_request("ID does not change"));
        }
        let mut errors = FieldErrors::default();
        if let Some(title) = &self.title {
            errors.check("title", require_text(title));
        }
        if let Some(handle) = &self.company_handle {
            errors.check("company_handle", require_text(handle));
        }
        errors.check("salary", validate_non_negative(self.salary));
        errors.check("equity", validate_equity(self.equity));
        errors.finish()
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::default();
        errors.check("username", validate_username_format(&self.username));
        errors.check("password", require_text(&self.password));
        errors.check("first_name", require_text(&self.first_name));
        errors.check("last_name", require_text(&self.last_name));
        errors.check("email", validate_email_format(&self.email));
        errors.finish()
    }
}

/// PATCH /users/:username body
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing)]
    pub username: Option<Value>,
    #[serde(default, skip_serializing)]
    pub is_admin: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("photo_url", &self.photo_url)
            .finish()
    }
}

impl UserPatch {
    pub fn to_fields(&self) -> Result<FieldMap, ApiError> {
        serialize_fields(self)
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_some() || self.is_admin.is_some() {
            return Err(ApiError::bad_request("Username or admin status does not change"));
        }
        let mut errors = FieldErrors::default();
        if let Some(password) = &self.password {
            errors.check("password", require_text(password));
        }
        if let Some(first_name) = &self.first_name {
            errors.check("first_name", require_text(first_name));
        }
        if let Some(last_name) = &self.last_name {
            errors.check("last_name", require_text(last_name));
        }
        if let Some(email) = &self.email {
            errors.check("email", validate_email_format(email));
        }
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {}

/// POST /jobs/:id/apply body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyRequest {
    pub state: Option<String>,
}

impl Validate for ApplyRequest {}
