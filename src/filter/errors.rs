//! Filter compilation error types
//!
//! Error codes:
//! - PLINTH_FILTER_MALFORMED (REJECT)
//! - PLINTH_FILTER_UNKNOWN_FIELD (REJECT)
//! - PLINTH_FILTER_UNKNOWN_OPERATOR (REJECT)
//! - PLINTH_FILTER_OPERAND_MISMATCH (REJECT)

use std::fmt;

/// Severity levels for filter errors
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

/// Filter-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorCode {
    /// Expression is not an operator-keyed object
    FilterMalformed,
    /// Field is not declared on the entity
    FilterUnknownField,
    /// Operator name is not recognized
    FilterUnknownOperator,
    /// Operand type does not fit the operator or field
    FilterOperandMismatch,
}

impl FilterErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            FilterErrorCode::FilterMalformed => "PLINTH_FILTER_MALFORMED",
            FilterErrorCode::FilterUnknownField => "PLINTH_FILTER_UNKNOWN_FIELD",
            FilterErrorCode::FilterUnknownOperator => "PLINTH_FILTER_UNKNOWN_OPERATOR",
            FilterErrorCode::FilterOperandMismatch => "PLINTH_FILTER_OPERAND_MISMATCH",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Filter error type with full context
#[derive(Debug, Clone)]
pub struct FilterError {
    /// Error code
    code: FilterErrorCode,
    /// Human-readable message
    message: String,
    /// Field name if applicable
    field: Option<String>,
}

impl FilterError {
    /// Create a malformed expression error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: FilterErrorCode::FilterMalformed,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: FilterErrorCode::FilterUnknownField,
            message: format!("field '{}' is not declared on the entity", f),
            field: Some(f),
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(field: impl Into<String>, op: &str) -> Self {
        let f = field.into();
        Self {
            code: FilterErrorCode::FilterUnknownOperator,
            message: format!("unknown operator '{}' on field '{}'", op, f),
            field: Some(f),
        }
    }

    /// Create an operand mismatch error
    pub fn operand_mismatch(field: impl Into<String>, detail: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: FilterErrorCode::FilterOperandMismatch,
            message: format!("operand for field '{}' {}", f, detail.into()),
            field: Some(f),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> FilterErrorCode {
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

impl fmt::Display for FilterError {
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

impl std::error::Error for FilterError {}

/// Result type for filter compilation
pub type FilterResult<T> = Result<T, FilterError>;
