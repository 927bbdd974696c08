//! Planner error types
//!
//! Error codes:
//! - PLINTH_QUERY_UNKNOWN_FIELD (REJECT)
//! - PLINTH_QUERY_NOT_UNIQUE (REJECT)
//! - PLINTH_QUERY_TYPE_MISMATCH (REJECT)
//! - PLINTH_QUERY_MISSING_FIELD (REJECT)
//! - PLINTH_QUERY_IMMUTABLE_FIELD (REJECT)
//! - PLINTH_QUERY_HAVING_INVALID (REJECT)
//! - PLINTH_QUERY_INVALID (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected; nothing was executed
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Projection, ordering, grouping, or payload names an undeclared field
    QueryUnknownField,
    /// Unique lookup keyed by a field not declared unique
    QueryNotUnique,
    /// Payload or key value does not fit the field's declared type
    QueryTypeMismatch,
    /// Required field absent from a create payload
    QueryMissingField,
    /// Write payload attempts to change the primary key
    QueryImmutableField,
    /// Having expression is structurally invalid
    QueryHavingInvalid,
    /// Malformed query structure
    QueryInvalid,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::QueryUnknownField => "PLINTH_QUERY_UNKNOWN_FIELD",
            PlannerErrorCode::QueryNotUnique => "PLINTH_QUERY_NOT_UNIQUE",
            PlannerErrorCode::QueryTypeMismatch => "PLINTH_QUERY_TYPE_MISMATCH",
            PlannerErrorCode::QueryMissingField => "PLINTH_QUERY_MISSING_FIELD",
            PlannerErrorCode::QueryImmutableField => "PLINTH_QUERY_IMMUTABLE_FIELD",
            PlannerErrorCode::QueryHavingInvalid => "PLINTH_QUERY_HAVING_INVALID",
            PlannerErrorCode::QueryInvalid => "PLINTH_QUERY_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Field name if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>, context: &str) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::QueryUnknownField,
            message: format!("{} names undeclared field '{}'", context, f),
            field: Some(f),
        }
    }

    /// Create a not-unique key error
    pub fn not_unique(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::QueryNotUnique,
            message: format!("field '{}' is not declared unique", f),
            field: Some(f),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(field: impl Into<String>, expected: &str) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::QueryTypeMismatch,
            message: format!("value for field '{}' must be a {}", f, expected),
            field: Some(f),
        }
    }

    /// Create a missing required field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::QueryMissingField,
            message: format!("required field '{}' is missing", f),
            field: Some(f),
        }
    }

    /// Create an immutable field error
    pub fn immutable_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::QueryImmutableField,
            message: format!("primary key field '{}' cannot be updated", f),
            field: Some(f),
        }
    }

    /// Create an invalid having error
    pub fn having_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::QueryHavingInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Create a generic invalid query error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::QueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
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

    /// Returns the offending field, if known
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
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

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
