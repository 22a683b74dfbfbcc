use serde_json::Value;
use sqlx::PgPool;

use crate::auth::password::{hash_password, verify_password};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, PublicUser, User, UserDetail, UserJob, UserSummary};
use crate::database::query_builder::QueryBuilder;
use crate::filter::FieldMap;

const USER_COLUMNS: &str = "username, password, first_name, last_name, email, photo_url, is_admin";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// The user whose stored hash matches `password`, if any. Unknown users
    /// and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, DatabaseError> {
        let Some(user) = self.find(username).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn register(&self, data: &NewUser) -> Result<User, DatabaseError> {
        if self.find(&data.username).await?.is_some() {
            return Err(DatabaseError::Conflict(format!(
                "There is already a user with the username {}",
                data.username
            )));
        }

        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let hashed = hash_password(&data.password, self.bcrypt_cost).await?;
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&data.username)
            .bind(hashed)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.photo_url)
            .bind(data.is_admin)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Registered user '{}' (admin={})", user.username, user.is_admin);
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        Ok(sqlx::query_as::<_, UserSummary>(
            "SELECT username, first_name, last_name, email FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Public profile plus the jobs the user applied to
    pub async fn get(&self, username: &str) -> Result<UserDetail, DatabaseError> {
        let user = sqlx::query_as::<_, PublicUser>(
            "SELECT username, first_name, last_name, email, photo_url FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No such username: {}", username)))?;

        let jobs = sqlx::query_as::<_, UserJob>(
            r#"
            SELECT j.title, j.company_handle, a.state
            FROM applications AS a
            JOIN jobs AS j ON j.id = a.job_id
            WHERE a.username = $1
            ORDER BY a.created_at
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserDetail { user, jobs })
    }

    /// Apply a partial update. A `password` entry is hashed before it is stored.
    pub async fn update(&self, username: &str, fields: &FieldMap) -> Result<PublicUser, DatabaseError> {
        let mut fields = fields.clone();
        if let Some(Value::String(plain)) = fields.get("password") {
            let hashed = hash_password(plain, self.bcrypt_cost).await?;
            fields.insert("password".to_string(), Value::String(hashed));
        }

        let user = QueryBuilder::<User>::partial_update("users", &fields, "username", username)?
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} does not exist", username)))?;

        Ok(user.into())
    }

    pub async fn remove(&self, username: &str) -> Result<(), DatabaseError> {
        let deleted: Option<(String,)> =
            sqlx::query_as("DELETE FROM users WHERE username = $1 RETURNING username")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        match deleted {
            Some(_) => {
                tracing::info!("Deleted user '{}'", username);
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("{} does not exist", username))),
        }
    }

    async fn find(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }
}
