use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Join row between a user and a job they applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub username: String,
    pub job_id: i32,
    pub state: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// A job as listed on a user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserJob {
    pub title: Option<String>,
    pub company_handle: String,
    pub state: Option<String>,
}
