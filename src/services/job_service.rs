use serde::Deserialize;
use serde_json::Number;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Application, Company, Job, JobSummary, JobWithCompany, NewJob};
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FieldMap, Filter, FilterCriteria, QueryError};
use crate::services::query_params::empty_as_none;

const LIST_SELECT: &str = "SELECT id, title, company_handle FROM jobs";
const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle, date_posted";

/// State recorded when an application names none
pub const DEFAULT_APPLICATION_STATE: &str = "applied";

/// Optional listing criteria accepted by `GET /jobs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_salary: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_equity: Option<f64>,
    pub search: Option<String>,
}

impl JobSearch {
    pub fn criteria(&self) -> Result<FilterCriteria, QueryError> {
        Ok(FilterCriteria::new()
            .range("salary", "salary", finite("min_salary", self.min_salary)?, None)
            .range("equity", "equity", finite("min_equity", self.min_equity)?, None)
            .search("search", "title", self.search.clone()))
    }

    pub fn filter(&self) -> Result<Filter, QueryError> {
        Filter::new(LIST_SELECT)
            .criteria(self.criteria()?)
            .order_by("date_posted")
    }
}

fn finite(field: &str, value: Option<f64>) -> Result<Option<Number>, QueryError> {
    value
        .map(|v| {
            Number::from_f64(v).ok_or_else(|| QueryError::InvalidValue {
                field: field.to_string(),
                reason: "must be a finite number".to_string(),
            })
        })
        .transpose()
}

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Jobs matching `search`, oldest posting first
    pub async fn list(&self, search: &JobSearch) -> Result<Vec<JobSummary>, DatabaseError> {
        let filter = search.filter()?;
        QueryBuilder::<JobSummary>::filtered(&filter)?
            .fetch_all(&self.pool)
            .await
    }

    /// A job plus the company that posted it
    pub async fn get(&self, id: i32) -> Result<JobWithCompany, DatabaseError> {
        let job = self.find(id).await?;

        let company = sqlx::query_as::<_, Company>(
            "SELECT handle, name, num_employees, description, logo_url FROM companies WHERE handle = $1",
        )
        .bind(&job.company_handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(JobWithCompany { job, company })
    }

    /// Insert a job. An unknown `company_handle` fails the foreign key and
    /// surfaces as `IntegrityViolation`.
    pub async fn create(&self, data: &NewJob) -> Result<Job, DatabaseError> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(&data.company_handle)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created job {} for '{}'", job.id, job.company_handle);
        Ok(job)
    }

    pub async fn update(&self, id: i32, fields: &FieldMap) -> Result<Job, DatabaseError> {
        QueryBuilder::<Job>::partial_update("jobs", fields, "id", id)?
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} does not exist", id)))
    }

    pub async fn remove(&self, id: i32) -> Result<(), DatabaseError> {
        let deleted: Option<(i32,)> = sqlx::query_as("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match deleted {
            Some(_) => {
                tracing::info!("Deleted job {}", id);
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("{} does not exist", id))),
        }
    }

    /// Record (or restate) `username`'s application to job `id`
    pub async fn apply(&self, id: i32, username: &str, state: Option<&str>) -> Result<Application, DatabaseError> {
        self.find(id).await?;
        let state = state
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_APPLICATION_STATE);

        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (username, job_id, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (username, job_id) DO UPDATE SET state = EXCLUDED.state
            RETURNING username, job_id, state, created_at
            "#,
        )
        .bind(username)
        .bind(id)
        .bind(state)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("'{}' applied to job {} ({})", username, id, state);
        Ok(application)
    }

    async fn find(&self, id: i32) -> Result<Job, DatabaseError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No such job: {}", id)))
    }
}
