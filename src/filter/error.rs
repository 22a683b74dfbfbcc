use serde_json::Number;
use thiserror::Error;

/// Errors raised while building a statement, before storage is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("No fields supplied for update")]
    EmptyUpdate,

    #[error("Minimum {criterion} ({min}) must not exceed maximum {criterion} ({max})")]
    InvalidRange {
        criterion: String,
        min: Number,
        max: Number,
    },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
