use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::auth::password::PasswordError;
use crate::config::DatabaseConfig;
use crate::filter::QueryError;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate detected by an explicit existence check
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Duplicate detected by the database itself (lost a create race)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Integrity constraint violated: {0}")]
    IntegrityViolation(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return DatabaseError::UniqueViolation(constraint),
                Some("23503") => {
                    return DatabaseError::IntegrityViolation(format!(
                        "referenced record does not exist ({})",
                        constraint
                    ))
                }
                Some("23514") => {
                    return DatabaseError::IntegrityViolation(format!(
                        "value out of allowed range ({})",
                        constraint
                    ))
                }
                Some("23502") => {
                    return DatabaseError::IntegrityViolation("missing required value".to_string())
                }
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Builds the shared connection pool from configuration
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect eagerly; fails fast when the database is unreachable
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = Self::database_url(config)?;
        let pool = Self::pool_options(config).connect(url).await?;
        info!(
            "Created database pool (max_connections={})",
            config.max_connections
        );
        Ok(pool)
    }

    /// Build a pool that opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = Self::database_url(config)?;
        Ok(Self::pool_options(config).connect_lazy(url)?)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    fn database_url(config: &DatabaseConfig) -> Result<&str, DatabaseError> {
        config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))
    }
}
