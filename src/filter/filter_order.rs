use super::error::QueryError;
use super::filter::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `"name"` / `"date_posted desc"` into an order entry.
    pub fn parse(order: &str) -> Result<FilterOrderInfo, QueryError> {
        let mut it = order.split_whitespace();
        let column = it
            .next()
            .ok_or_else(|| QueryError::InvalidIdentifier(order.to_string()))?;
        validate_identifier(column)?;
        let sort = match it.next() {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            None => SortDirection::Asc,
            Some(other) => return Err(QueryError::InvalidIdentifier(other.to_string())),
        };
        Ok(FilterOrderInfo { column: column.to_string(), sort })
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, QueryError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            validate_identifier(&info.column)?;
            parts.push(format!("{}{}", info.column, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
