use thiserror::Error;

use crate::value::SqlValue;

/// Crate-wide error type.
///
/// Query failures always carry the literal SQL that was sent to the handle
/// and the original (pre-sanitization) bindings, so callers can log or retry
/// without reconstructing either.
#[derive(Debug, Error)]
pub enum SqlConduitError {
    /// A statement failed at the underlying handle.
    #[error("query failed: {cause} (sql: {sql}, bindings: {bindings:?})")]
    Query {
        /// The literal SQL text sent to the handle.
        sql: String,
        /// The bindings as supplied by the caller, before sanitization.
        bindings: Vec<SqlValue>,
        /// The handle's side-channel error text (or a sentinel description).
        cause: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlConduitError {
    /// Build the query-failure variant.
    #[must_use]
    pub fn query(sql: impl Into<String>, bindings: &[SqlValue], cause: impl Into<String>) -> Self {
        SqlConduitError::Query {
            sql: sql.into(),
            bindings: bindings.to_vec(),
            cause: cause.into(),
        }
    }

    /// The underlying cause text for query failures, the display text otherwise.
    #[must_use]
    pub fn cause_text(&self) -> String {
        match self {
            SqlConduitError::Query { cause, .. } => cause.clone(),
            other => other.to_string(),
        }
    }
}
