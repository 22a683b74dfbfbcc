use serde_json::Value;

use super::error::QueryError;
use super::filter::validate_identifier;
use super::types::{FilterCriteria, ParamList};

/// Turns listing criteria into `WHERE` predicates plus their params.
pub struct FilterWhere {
    params: ParamList,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self {
            params: ParamList::new(),
            conditions: vec![],
        }
    }

    /// Validate, then render predicates joined with ` AND `.
    ///
    /// Returns an empty string when no criterion is present.
    pub fn generate(criteria: &FilterCriteria) -> Result<(String, ParamList), QueryError> {
        Self::validate(criteria)?;
        let mut filter_where = Self::new();
        filter_where.build(criteria);
        Ok((filter_where.conditions.join(" AND "), filter_where.params))
    }

    /// Reject inverted ranges and unsafe column names.
    pub fn validate(criteria: &FilterCriteria) -> Result<(), QueryError> {
        for range in &criteria.ranges {
            validate_identifier(&range.column)?;
            if range.is_inverted() {
                if let (Some(min), Some(max)) = (&range.min, &range.max) {
                    return Err(QueryError::InvalidRange {
                        criterion: range.name.clone(),
                        min: min.clone(),
                        max: max.clone(),
                    });
                }
            }
        }
        for search in &criteria.searches {
            validate_identifier(&search.column)?;
        }
        Ok(())
    }

    fn build(&mut self, criteria: &FilterCriteria) {
        for range in &criteria.ranges {
            if let Some(min) = &range.min {
                let marker = self.params.placeholder(Value::Number(min.clone()));
                self.conditions.push(format!("{} >= {}", range.column, marker));
            }
            if let Some(max) = &range.max {
                let marker = self.params.placeholder(Value::Number(max.clone()));
                self.conditions.push(format!("{} <= {}", range.column, marker));
            }
        }
        for search in &criteria.searches {
            let marker = self.params.placeholder(format!("%{}%", search.term));
            self.conditions.push(format!("{} ILIKE {}", search.column, marker));
        }
    }
}

impl Default for FilterWhere {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Number};

    #[test]
    fn ranges_render_before_searches() {
        let criteria = FilterCriteria::new()
            .search("search", "name", Some("inc".into()))
            .range("employees", "num_employees", Some(Number::from(10)), Some(Number::from(500)));

        let (sql, params) = FilterWhere::generate(&criteria).unwrap();
        assert_eq!(
            sql,
            "num_employees >= $1 AND num_employees <= $2 AND name ILIKE $3"
        );
        assert_eq!(params.as_slice(), &[json!(10), json!(500), json!("%inc%")]);
    }

    #[test]
    fn no_criteria_renders_nothing() {
        let (sql, params) = FilterWhere::generate(&FilterCriteria::new()).unwrap();
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_unsafe_columns() {
        let criteria = FilterCriteria::new().search("search", "name; DROP TABLE jobs", Some("x".into()));
        assert!(matches!(
            FilterWhere::generate(&criteria),
            Err(QueryError::InvalidIdentifier(_))
        ));
    }
}
