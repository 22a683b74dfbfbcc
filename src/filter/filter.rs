use super::error::QueryError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterCriteria, FilterOrderInfo, SqlResult};

/// Composes a listing `SELECT` from a fixed base statement, optional criteria
/// and an ordering column.
///
/// ```text
/// <base_select>[ WHERE p1[ AND p2 ...]] ORDER BY <column>
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    base_select: String,
    criteria: FilterCriteria,
    order_data: Vec<FilterOrderInfo>,
}

impl Filter {
    pub fn new(base_select: impl Into<String>) -> Self {
        Self {
            base_select: base_select.into(),
            criteria: FilterCriteria::default(),
            order_data: vec![],
        }
    }

    pub fn criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn order_by(mut self, order: &str) -> Result<Self, QueryError> {
        self.order_data.push(FilterOrder::parse(order)?);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        let (where_clause, params) = FilterWhere::generate(&self.criteria)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;

        let query = [
            self.base_select.trim_end().to_string(),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        tracing::debug!(query = %query, params = params.len(), "composed filtered select");
        Ok(SqlResult { query, params })
    }
}

/// Shorthand for `Filter::new(base).criteria(criteria).order_by(order)?.to_sql()`.
pub fn build(base_select: &str, criteria: FilterCriteria, order_by: &str) -> Result<SqlResult, QueryError> {
    Filter::new(base_select).criteria(criteria).order_by(order_by)?.to_sql()
}

/// Identifiers are interpolated into statement text, so only plain
/// `[A-Za-z_][A-Za-z0-9_]*` names are accepted.
pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}
