//! Row sorting for query execution
//!
//! Sorts rows deterministically before windowing and projection.

use std::cmp::Ordering;

use serde_json::Value;

use crate::filter::Row;
use crate::planner::{SortDirection, SortSpec};

/// Sorts raw rows
pub struct RowSorter;

impl RowSorter {
    /// Sorts rows according to the sort specification.
    ///
    /// Sort is stable: rows that compare equal keep their backend
    /// (primary-key) order.
    pub fn sort(rows: &mut [Row], sort_spec: &SortSpec) {
        rows.sort_by(|a, b| {
            let a_val = a.get(&sort_spec.field);
            let b_val = b.get(&sort_spec.field);

            let ordering = Self::compare_values(a_val, b_val);

            match sort_spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - absent < null < bool < number < string
    /// - For same types, natural ordering
    pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                let a_type = type_order(a_val);
                let b_type = type_order(b_val);

                if a_type != b_type {
                    return a_type.cmp(&b_type);
                }

                match (a_val, b_val) {
                    (Value::Null, Value::Null) => Ordering::Equal,
                    (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                    (Value::Number(a_n), Value::Number(b_n)) => {
                        let a_f = a_n.as_f64().unwrap_or(0.0);
                        let b_f = b_n.as_f64().unwrap_or(0.0);
                        a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                    _ => Ordering::Equal, // Arrays and objects not compared
                }
            }
        }
    }
}
