//! Public error taxonomy
//!
//! Every operation surfaces its failure to the immediate caller; the
//! layer performs no implicit retries. Only [`QueryError::Transient`]
//! is safe to retry: it guarantees no partial effect was applied.

use thiserror::Error;

use crate::filter::FilterError;
use crate::planner::PlannerError;
use crate::storage::StorageError;

/// Result type for client operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors surfaced by the query layer
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed or mistyped filter expression. Fatal to the call;
    /// retrying cannot change the outcome.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// Structurally invalid query: bad projection, ordering, grouping,
    /// payload, or unique key. Same policy as an invalid filter.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] PlannerError),

    /// A strict single-row operation targeted no row
    #[error("no {entity} found for the given {key}")]
    NotFound {
        /// Entity name
        entity: String,
        /// Key or lookup description
        key: String,
    },

    /// A unique field collided on write. Never retried implicitly,
    /// since retrying would not change the outcome.
    #[error("unique constraint violated on field '{field}'")]
    UniqueConstraint {
        /// The violated field
        field: String,
    },

    /// Backend or transaction failure with no partial effect applied.
    /// Safe to retry at the caller's discretion.
    #[error("transient backend failure: {0}")]
    Transient(String),
}

impl QueryError {
    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Returns true if the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transient(_))
    }
}

impl From<StorageError> for QueryError {
    fn from(err: StorageError) -> Self {
        if err.is_unique_violation() {
            return QueryError::UniqueConstraint {
                field: err.field().unwrap_or("unknown").to_string(),
            };
        }
        QueryError::Transient(err.to_string())
    }
}
