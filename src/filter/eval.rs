//! Predicate evaluation
//!
//! Matches rows strictly according to compiled predicates.
//! No type coercion, no expressions, exact match only.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::ast::{Filter, FilterOp, Predicate};

/// One raw row as produced by a storage backend
pub type Row = Map<String, Value>;

/// Evaluates compiled filters against rows
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a row matches every predicate of the filter
    pub fn matches(row: &Row, filter: &Filter) -> bool {
        filter
            .predicates
            .iter()
            .all(|pred| Self::matches_predicate(row, pred))
    }

    /// Checks if a row matches a single predicate
    fn matches_predicate(row: &Row, predicate: &Predicate) -> bool {
        let field_value = match row.get(&predicate.field) {
            Some(v) => v,
            None => return false, // Missing field = no match
        };

        // Null values never match
        if field_value.is_null() {
            return false;
        }

        match &predicate.op {
            FilterOp::Eq(expected) => field_value == expected,
            FilterOp::Contains(needle) => field_value
                .as_str()
                .is_some_and(|s| s.contains(needle.as_str())),
            FilterOp::EndsWith(suffix) => field_value
                .as_str()
                .is_some_and(|s| s.ends_with(suffix.as_str())),
            FilterOp::Gt(bound) => {
                Self::compare_scalars(field_value, bound) == Some(Ordering::Greater)
            }
            FilterOp::Lte(bound) => matches!(
                Self::compare_scalars(field_value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In(values) => values.contains(field_value),
        }
    }

    /// Compares two same-type scalars; None for incomparable pairs.
    ///
    /// Integer pairs compare exactly; mixed numbers compare as floats.
    pub(crate) fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                    return Some(ai.cmp(&bi));
                }
                let af = a.as_f64()?;
                let bf = b.as_f64()?;
                af.partial_cmp(&bf)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
