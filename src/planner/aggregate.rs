//! Aggregate specification structures
//!
//! An [`AggregateSpec`] extends a query spec with scalar aggregate
//! requests and, for grouped queries, grouping keys plus a `having`
//! expression evaluated over computed aggregates rather than raw rows.

use serde_json::Value;

use crate::filter::FilterOp;

use super::query::QuerySpec;

/// Aggregate functions computable per field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Min,
    Max,
    Avg,
    Sum,
}

impl AggregateFunc {
    /// Returns the function name as written in having expressions
    pub fn key(&self) -> &'static str {
        match self {
            AggregateFunc::Min => "_min",
            AggregateFunc::Max => "_max",
            AggregateFunc::Avg => "_avg",
            AggregateFunc::Sum => "_sum",
        }
    }

    /// Returns the SQL-flavored name used in rendered statements
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Sum => "SUM",
        }
    }

    /// Parses a having-expression function key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "_min" => Some(AggregateFunc::Min),
            "_max" => Some(AggregateFunc::Max),
            "_avg" => Some(AggregateFunc::Avg),
            "_sum" => Some(AggregateFunc::Sum),
            _ => None,
        }
    }

    /// Returns true if the function is only defined over numeric fields
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregateFunc::Avg | AggregateFunc::Sum)
    }
}

/// One compiled having condition: an aggregate of a field compared
/// against an operand.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingCondition {
    /// Field the aggregate is computed over
    pub field: String,
    /// Aggregate function applied before comparison
    pub func: AggregateFunc,
    /// Comparison applied to the computed aggregate
    pub op: FilterOp,
}

/// Declarative aggregation specification.
///
/// Without grouping keys this describes a single-row scalar aggregate;
/// with keys it describes a grouped aggregate whose groups are filtered
/// by `having` after aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregateSpec {
    /// Row selection (filter, ordering, window) applied before grouping
    pub query: QuerySpec,
    /// Request a count of all matching rows
    pub count_all: bool,
    /// Fields to take minima of
    pub min: Vec<String>,
    /// Fields to take maxima of
    pub max: Vec<String>,
    /// Fields to average
    pub avg: Vec<String>,
    /// Fields to sum
    pub sum: Vec<String>,
    /// Grouping key fields; empty for scalar aggregation
    pub by: Vec<String>,
    /// Raw having expression over aggregate results
    pub having: Option<Value>,
}

impl AggregateSpec {
    /// Creates an empty aggregate spec (no aggregates requested)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the underlying row selection
    pub fn with_query(mut self, query: QuerySpec) -> Self {
        self.query = query;
        self
    }

    /// Sets the filter expression on the underlying selection
    pub fn with_filter(mut self, expr: Value) -> Self {
        self.query.filter = Some(expr);
        self
    }

    /// Requests a count of matching rows
    pub fn with_count(mut self) -> Self {
        self.count_all = true;
        self
    }

    /// Requests the minimum of a field
    pub fn with_min(mut self, field: impl Into<String>) -> Self {
        self.min.push(field.into());
        self
    }

    /// Requests the maximum of a field
    pub fn with_max(mut self, field: impl Into<String>) -> Self {
        self.max.push(field.into());
        self
    }

    /// Requests the average of a field
    pub fn with_avg(mut self, field: impl Into<String>) -> Self {
        self.avg.push(field.into());
        self
    }

    /// Requests the sum of a field
    pub fn with_sum(mut self, field: impl Into<String>) -> Self {
        self.sum.push(field.into());
        self
    }

    /// Sets the grouping keys
    pub fn with_group_by(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the having expression
    pub fn with_having(mut self, expr: Value) -> Self {
        self.having = Some(expr);
        self
    }

    /// Returns true if grouping keys are present
    pub fn is_grouped(&self) -> bool {
        !self.by.is_empty()
    }

    /// Returns true if any aggregate was requested
    pub fn requests_any(&self) -> bool {
        self.count_all
            || !self.min.is_empty()
            || !self.max.is_empty()
            || !self.avg.is_empty()
            || !self.sum.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aggregate_builder() {
        let spec = AggregateSpec::new()
            .with_filter(json!({"email": {"contains": "xx"}}))
            .with_count()
            .with_min("age")
            .with_max("age")
            .with_avg("age");

        assert!(spec.count_all);
        assert_eq!(spec.min, vec!["age".to_string()]);
        assert!(spec.requests_any());
        assert!(!spec.is_grouped());
    }

    #[test]
    fn test_grouped_builder() {
        let spec = AggregateSpec::new()
            .with_group_by(["email"])
            .with_count()
            .with_sum("age")
            .with_having(json!({"age": {"_avg": {"gt": 2}}}));

        assert!(spec.is_grouped());
        assert!(spec.having.is_some());
    }

    #[test]
    fn test_func_keys_round_trip() {
        for func in [
            AggregateFunc::Min,
            AggregateFunc::Max,
            AggregateFunc::Avg,
            AggregateFunc::Sum,
        ] {
            assert_eq!(AggregateFunc::from_key(func.key()), Some(func));
        }
        assert_eq!(AggregateFunc::from_key("_count"), None);
    }

    #[test]
    fn test_numeric_only_functions() {
        assert!(AggregateFunc::Avg.requires_numeric());
        assert!(AggregateFunc::Sum.requires_numeric());
        assert!(!AggregateFunc::Min.requires_numeric());
        assert!(!AggregateFunc::Max.requires_numeric());
    }
}
