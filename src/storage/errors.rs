//! Storage error types
//!
//! Error codes:
//! - PLINTH_STORAGE_UNIQUE_CONSTRAINT (ERROR)
//! - PLINTH_STORAGE_TXN_ABORTED (ERROR, retryable)
//! - PLINTH_STORAGE_UNKNOWN_TABLE (ERROR)
//! - PLINTH_STORAGE_WRITE_FAILED (ERROR)

use std::fmt;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the backend stays healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// A unique field collided on write
    StorageUniqueConstraint,
    /// The enclosing transaction aborted; no effect was applied
    StorageTxnAborted,
    /// Plan targets a table this backend does not own
    StorageUnknownTable,
    /// Write produced no usable result
    StorageWriteFailed,
}

impl StorageErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::StorageUniqueConstraint => "PLINTH_STORAGE_UNIQUE_CONSTRAINT",
            StorageErrorCode::StorageTxnAborted => "PLINTH_STORAGE_TXN_ABORTED",
            StorageErrorCode::StorageUnknownTable => "PLINTH_STORAGE_UNKNOWN_TABLE",
            StorageErrorCode::StorageWriteFailed => "PLINTH_STORAGE_WRITE_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug, Clone)]
pub struct StorageError {
    /// Error code
    code: StorageErrorCode,
    /// Human-readable message
    message: String,
    /// Field name if applicable
    field: Option<String>,
}

impl StorageError {
    /// Create a unique constraint violation
    pub fn unique_constraint(field: impl Into<String>, value: impl fmt::Display) -> Self {
        let f = field.into();
        Self {
            code: StorageErrorCode::StorageUniqueConstraint,
            message: format!("unique constraint on '{}' violated by value {}", f, value),
            field: Some(f),
        }
    }

    /// Create a transaction aborted error
    pub fn txn_aborted(reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::StorageTxnAborted,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::StorageUnknownTable,
            message: format!("backend does not own table '{}'", table.into()),
            field: None,
        }
    }

    /// Create a write failed error
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::StorageWriteFailed,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the violated field for unique constraint errors
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns true for unique constraint violations
    pub fn is_unique_violation(&self) -> bool {
        self.code == StorageErrorCode::StorageUniqueConstraint
    }

    /// Returns true for errors that are safe to retry: the backend
    /// guarantees no partial effect was applied.
    pub fn is_transient(&self) -> bool {
        self.code == StorageErrorCode::StorageTxnAborted
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StorageErrorCode::StorageUniqueConstraint.code(),
            "PLINTH_STORAGE_UNIQUE_CONSTRAINT"
        );
        assert_eq!(
            StorageErrorCode::StorageTxnAborted.code(),
            "PLINTH_STORAGE_TXN_ABORTED"
        );
    }

    #[test]
    fn test_classification() {
        let unique = StorageError::unique_constraint("id", 11);
        assert!(unique.is_unique_violation());
        assert!(!unique.is_transient());
        assert_eq!(unique.field(), Some("id"));

        let aborted = StorageError::txn_aborted("lock lost");
        assert!(aborted.is_transient());
        assert!(!aborted.is_unique_violation());
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::unique_constraint("id", 11);
        let display = format!("{}", err);
        assert!(display.contains("PLINTH_STORAGE_UNIQUE_CONSTRAINT"));
        assert!(display.contains("11"));
    }
}
