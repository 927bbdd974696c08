//! Aggregate computation
//!
//! Computes scalar aggregates and grouped aggregates over fetched rows.
//! Null and missing field values never contribute to an aggregate; a
//! field with no contributing rows yields null for min/max/avg/sum and
//! 0 for count. Having conditions are evaluated over the computed
//! aggregates of each partition, never over raw rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::filter::{FilterOp, PredicateFilter, Row};
use crate::planner::{AggregateFunc, AggregatePlan, GroupByPlan, HavingCondition};

use super::sorter::RowSorter;

/// Computed aggregates: one entry per requested field.
///
/// `count` is None when no count was requested, Some(0) for an empty
/// row set.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// Count of all matching rows, if requested
    pub count: Option<u64>,
    /// Minimum per requested field
    pub min: BTreeMap<String, Value>,
    /// Maximum per requested field
    pub max: BTreeMap<String, Value>,
    /// Average per requested field (always a float or null)
    pub avg: BTreeMap<String, Value>,
    /// Sum per requested field
    pub sum: BTreeMap<String, Value>,
}

/// One group of a grouped aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Grouping key values, keyed by field name
    pub key: BTreeMap<String, Value>,
    /// Aggregates computed over the group's rows
    pub aggregates: AggregateRow,
}

/// Computes aggregates over fetched rows
pub struct Aggregator;

impl Aggregator {
    /// Computes the aggregates an aggregate plan requests
    pub fn aggregate(rows: &[Row], plan: &AggregatePlan) -> AggregateRow {
        let mut result = AggregateRow {
            count: plan.count_all.then_some(rows.len() as u64),
            min: BTreeMap::new(),
            max: BTreeMap::new(),
            avg: BTreeMap::new(),
            sum: BTreeMap::new(),
        };
        for field in &plan.min {
            result
                .min
                .insert(field.clone(), Self::compute(AggregateFunc::Min, rows, field));
        }
        for field in &plan.max {
            result
                .max
                .insert(field.clone(), Self::compute(AggregateFunc::Max, rows, field));
        }
        for field in &plan.avg {
            result
                .avg
                .insert(field.clone(), Self::compute(AggregateFunc::Avg, rows, field));
        }
        for field in &plan.sum {
            result
                .sum
                .insert(field.clone(), Self::compute(AggregateFunc::Sum, rows, field));
        }
        result
    }

    /// Partitions rows by the grouping key tuple, computes per-group
    /// aggregates, and drops groups failing the having conditions.
    ///
    /// Groups are emitted in deterministic key order. A partition only
    /// exists if at least one row produced it, so empty groups are
    /// never emitted.
    pub fn group_by(rows: &[Row], plan: &GroupByPlan) -> Vec<GroupRow> {
        let mut partitions: BTreeMap<String, (BTreeMap<String, Value>, Vec<Row>)> =
            BTreeMap::new();

        for row in rows {
            let key: BTreeMap<String, Value> = plan
                .by
                .iter()
                .map(|field| (field.clone(), row.get(field).cloned().unwrap_or(Value::Null)))
                .collect();
            let ordering_key = serde_json::to_string(&key).unwrap_or_default();
            partitions
                .entry(ordering_key)
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push(row.clone());
        }

        partitions
            .into_values()
            .filter(|(_, rows)| Self::passes_having(rows, &plan.having))
            .map(|(key, rows)| GroupRow {
                key,
                aggregates: Self::aggregate(&rows, &plan.aggregate),
            })
            .collect()
    }

    /// Evaluates having conditions over one partition's computed
    /// aggregates. Null aggregates never pass.
    fn passes_having(rows: &[Row], conditions: &[HavingCondition]) -> bool {
        conditions.iter().all(|cond| {
            let value = Self::compute(cond.func, rows, &cond.field);
            Self::compare_aggregate(&value, &cond.op)
        })
    }

    fn compare_aggregate(value: &Value, op: &FilterOp) -> bool {
        if value.is_null() {
            return false;
        }
        match op {
            FilterOp::Eq(expected) => Self::scalar_eq(value, expected),
            FilterOp::Gt(bound) => {
                PredicateFilter::compare_scalars(value, bound) == Some(Ordering::Greater)
            }
            FilterOp::Lte(bound) => matches!(
                PredicateFilter::compare_scalars(value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In(values) => values.iter().any(|v| Self::scalar_eq(value, v)),
            // Rejected by the planner for aggregates
            FilterOp::Contains(_) | FilterOp::EndsWith(_) => false,
        }
    }

    /// Equality that treats 3 and 3.0 as equal
    fn scalar_eq(a: &Value, b: &Value) -> bool {
        PredicateFilter::compare_scalars(a, b) == Some(Ordering::Equal) || a == b
    }

    /// Computes one aggregate function over one field
    pub(crate) fn compute(func: AggregateFunc, rows: &[Row], field: &str) -> Value {
        match func {
            AggregateFunc::Min => Self::extreme(rows, field, Ordering::Less),
            AggregateFunc::Max => Self::extreme(rows, field, Ordering::Greater),
            AggregateFunc::Avg => {
                let numbers = Self::numeric_values(rows, field);
                if numbers.is_empty() {
                    return Value::Null;
                }
                let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
                Number::from_f64(total / numbers.len() as f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            AggregateFunc::Sum => {
                let numbers = Self::numeric_values(rows, field);
                if numbers.is_empty() {
                    return Value::Null;
                }
                if numbers.iter().all(|n| n.as_i64().is_some()) {
                    let total: i64 = numbers.iter().filter_map(|n| n.as_i64()).sum();
                    return Value::from(total);
                }
                let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
                Number::from_f64(total).map(Value::Number).unwrap_or(Value::Null)
            }
        }
    }

    fn extreme(rows: &[Row], field: &str, want: Ordering) -> Value {
        let mut best: Option<&Value> = None;
        for value in rows.iter().filter_map(|r| r.get(field)) {
            if value.is_null() {
                continue;
            }
            best = match best {
                None => Some(value),
                Some(current) => {
                    if RowSorter::compare_values(Some(value), Some(current)) == want {
                        Some(value)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.cloned().unwrap_or(Value::Null)
    }

    fn numeric_values(rows: &[Row], field: &str) -> Vec<Number> {
        rows.iter()
            .filter_map(|r| r.get(field))
            .filter_map(|v| match v {
                Value::Number(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }
}
