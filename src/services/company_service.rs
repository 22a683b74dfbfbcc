use serde::Deserialize;
use serde_json::Number;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Company, CompanySummary, NewCompany};
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FieldMap, Filter, FilterCriteria, QueryError};
use crate::services::query_params::empty_as_none;

const LIST_SELECT: &str = "SELECT handle, name FROM companies";

/// Optional listing criteria accepted by `GET /companies`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanySearch {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_employees: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_employees: Option<i64>,
    pub search: Option<String>,
}

impl CompanySearch {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .range(
                "employees",
                "num_employees",
                self.min_employees.map(Number::from),
                self.max_employees.map(Number::from),
            )
            .search("search", "name", self.search.clone())
    }

    pub fn filter(&self) -> Result<Filter, QueryError> {
        Filter::new(LIST_SELECT).criteria(self.criteria()).order_by("name")
    }
}

#[derive(Clone)]
pub struct CompanyService {
    pool: PgPool,
}

impl CompanyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Companies matching `search`, ordered by name
    pub async fn list(&self, search: &CompanySearch) -> Result<Vec<CompanySummary>, DatabaseError> {
        let filter = search.filter()?;
        QueryBuilder::<CompanySummary>::filtered(&filter)?
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get(&self, handle: &str) -> Result<Company, DatabaseError> {
        sqlx::query_as::<_, Company>(
            "SELECT handle, name, num_employees, description, logo_url FROM companies WHERE handle = $1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No such company: {}", handle)))
    }

    /// Insert a company. A concurrent create that slips past the duplicate
    /// check surfaces as `UniqueViolation`.
    pub async fn create(&self, data: &NewCompany) -> Result<Company, DatabaseError> {
        if self.exists(&data.handle).await? {
            return Err(DatabaseError::Conflict(format!(
                "There already exists a company with handle '{}'",
                data.handle
            )));
        }

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (handle, name, num_employees, description, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING handle, name, num_employees, description, logo_url
            "#,
        )
        .bind(&data.handle)
        .bind(&data.name)
        .bind(data.num_employees)
        .bind(&data.description)
        .bind(&data.logo_url)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created company '{}'", company.handle);
        Ok(company)
    }

    pub async fn update(&self, handle: &str, fields: &FieldMap) -> Result<Company, DatabaseError> {
        QueryBuilder::<Company>::partial_update("companies", fields, "handle", handle)?
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} does not exist", handle)))
    }

    pub async fn remove(&self, handle: &str) -> Result<(), DatabaseError> {
        let deleted: Option<(String,)> =
            sqlx::query_as("DELETE FROM companies WHERE handle = $1 RETURNING handle")
                .bind(handle)
                .fetch_optional(&self.pool)
                .await?;

        match deleted {
            Some(_) => {
                tracing::info!("Deleted company '{}'", handle);
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("{} does not exist", handle))),
        }
    }

    async fn exists(&self, handle: &str) -> Result<bool, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT handle FROM companies WHERE handle = $1")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
