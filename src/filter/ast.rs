//! Compiled filter representation
//!
//! A filter is a flat list of predicates combined by implicit AND. Each
//! predicate binds an operator and operand to a named field; comparison
//! operators always bind to the field, never the literal.

use serde_json::Value;

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value
    Eq(Value),
    /// Substring containment: value is a substring of field
    Contains(String),
    /// Suffix match: field ends with value
    EndsWith(String),
    /// Strictly greater than: field > value
    Gt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Set membership: field is one of the listed values
    In(Vec<Value>),
}

impl FilterOp {
    /// Returns the operator name as written in filter expressions
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "equals",
            FilterOp::Contains(_) => "contains",
            FilterOp::EndsWith(_) => "endsWith",
            FilterOp::Gt(_) => "gt",
            FilterOp::Lte(_) => "lte",
            FilterOp::In(_) => "in",
        }
    }

    /// Returns true for ordering comparisons (gt, lte)
    pub fn is_comparison(&self) -> bool {
        matches!(self, FilterOp::Gt(_) | FilterOp::Lte(_))
    }

    /// Returns true for string-only operators
    pub fn is_string_match(&self) -> bool {
        matches!(self, FilterOp::Contains(_) | FilterOp::EndsWith(_))
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field name
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value),
        }
    }

    /// Create a substring containment predicate
    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Contains(needle.into()),
        }
    }

    /// Create a suffix predicate
    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::EndsWith(suffix.into()),
        }
    }

    /// Create a strictly-greater-than predicate
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gt(value),
        }
    }

    /// Create a less-than-or-equal predicate
    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lte(value),
        }
    }

    /// Create a set-membership predicate
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::In(values),
        }
    }
}

/// An immutable conjunction of predicates.
///
/// An empty filter matches every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    /// Predicates, all of which must match (AND semantics)
    pub predicates: Vec<Predicate>,
}

impl Filter {
    /// Creates a filter from predicates
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Creates the match-all filter
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a predicate
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Returns true if this filter matches every row
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
