use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::company::Company;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub title: Option<String>,
    pub salary: Option<f64>,
    pub equity: Option<f64>,
    pub company_handle: String,
    pub date_posted: Option<NaiveDateTime>,
}

/// Row shape of the job listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i32,
    pub title: Option<String>,
    pub company_handle: String,
}

/// A job together with the company that posted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWithCompany {
    #[serde(flatten)]
    pub job: Job,
    pub company: Option<Company>,
}

/// Insert payload for `jobs`; `id` and `date_posted` are assigned by the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<f64>,
    pub equity: Option<f64>,
    pub company_handle: String,
}
