use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{validate_identifier, FieldMap, Filter, ParamList, QueryError, SqlResult};

/// Build a partial update for the supplied fields:
///
/// ```text
/// UPDATE <table> SET c1=$1, c2=$2 WHERE <key_column>=$3 RETURNING *
/// ```
///
/// Assignments follow the map's insertion order and the key value is always
/// the last param. Column names must already be restricted to known columns
/// by the caller; anything that is not a plain identifier is still rejected.
pub fn sql_for_partial_update(
    table: &str,
    fields: &FieldMap,
    key_column: &str,
    key_value: impl Into<Value>,
) -> Result<SqlResult, QueryError> {
    if fields.is_empty() {
        return Err(QueryError::EmptyUpdate);
    }
    validate_identifier(table)?;
    validate_identifier(key_column)?;

    let mut params = ParamList::new();
    let mut assignments = Vec::with_capacity(fields.len());
    for (column, value) in fields {
        validate_identifier(column)?;
        assignments.push(format!("{}={}", column, params.placeholder(value.clone())));
    }
    let key_marker = params.placeholder(key_value);

    let query = format!(
        "UPDATE {} SET {} WHERE {}={} RETURNING *",
        table,
        assignments.join(", "),
        key_column,
        key_marker
    );
    tracing::debug!(query = %query, params = params.len(), "built partial update");
    Ok(SqlResult { query, params })
}

/// Runs a generated statement and maps the rows onto `T`.
pub struct QueryBuilder<T> {
    sql: SqlResult,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(sql: SqlResult) -> Self {
        Self {
            sql,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn partial_update(
        table: &str,
        fields: &FieldMap,
        key_column: &str,
        key_value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        Ok(Self::new(sql_for_partial_update(table, fields, key_column, key_value)?))
    }

    pub fn filtered(filter: &Filter) -> Result<Self, QueryError> {
        Ok(Self::new(filter.to_sql()?))
    }

    pub fn sql(&self) -> &SqlResult {
        &self.sql
    }

    pub async fn fetch_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn fetch_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
