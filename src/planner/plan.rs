//! Immutable, executable plans
//!
//! Plans carry no runtime state. Each plan renders a deterministic
//! SQL-flavored statement string for the query log; rendering is purely
//! observational and never executed as SQL.

use serde_json::{Map, Value};

use crate::filter::{Filter, FilterOp, Predicate};

use super::aggregate::HavingCondition;
use super::query::SortSpec;

/// Plan for a read: filter, ordering, and window over one table.
///
/// Projection is intentionally absent: the result mapper applies it
/// after ordering and windowing, so ordering by an unselected field
/// still takes effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    /// Table to read
    pub table: String,
    /// Row filter
    pub filter: Filter,
    /// Ordering over unprojected rows
    pub order_by: Option<SortSpec>,
    /// Rows to skip after ordering
    pub skip: u64,
    /// Maximum rows to return; None = unbounded
    pub take: Option<u64>,
}

impl ReadPlan {
    /// Renders the statement for tracing
    pub fn statement(&self) -> String {
        let mut stmt = format!("SELECT * FROM {}", self.table);
        push_where(&mut stmt, &self.filter);
        if let Some(sort) = &self.order_by {
            stmt.push_str(" ORDER BY ");
            stmt.push_str(&sort.field);
            stmt.push(' ');
            stmt.push_str(&sort.direction.as_str().to_uppercase());
        }
        if let Some(take) = self.take {
            stmt.push_str(&format!(" LIMIT {}", take));
        }
        if self.skip > 0 {
            stmt.push_str(&format!(" OFFSET {}", self.skip));
        }
        stmt
    }
}

/// Plan for a single write statement
#[derive(Debug, Clone, PartialEq)]
pub enum WritePlan {
    /// Insert one row; the backend assigns the primary key if absent
    Insert {
        table: String,
        row: Map<String, Value>,
    },
    /// Apply changes to every row matching the filter
    Update {
        table: String,
        filter: Filter,
        changes: Map<String, Value>,
    },
    /// Remove every row matching the filter
    Delete { table: String, filter: Filter },
}

impl WritePlan {
    /// Returns the target table
    pub fn table(&self) -> &str {
        match self {
            WritePlan::Insert { table, .. }
            | WritePlan::Update { table, .. }
            | WritePlan::Delete { table, .. } => table,
        }
    }

    /// Renders the statement for tracing
    pub fn statement(&self) -> String {
        match self {
            WritePlan::Insert { table, row } => {
                let columns: Vec<&str> = row.keys().map(String::as_str).collect();
                let values: Vec<String> = row.values().map(render_value).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    values.join(", ")
                )
            }
            WritePlan::Update {
                table,
                filter,
                changes,
            } => {
                let assignments: Vec<String> = changes
                    .iter()
                    .map(|(field, value)| format!("{} = {}", field, render_value(value)))
                    .collect();
                let mut stmt = format!("UPDATE {} SET {}", table, assignments.join(", "));
                push_where(&mut stmt, filter);
                stmt
            }
            WritePlan::Delete { table, filter } => {
                let mut stmt = format!("DELETE FROM {}", table);
                push_where(&mut stmt, filter);
                stmt
            }
        }
    }
}

/// Plan for a scalar aggregate over matching rows
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlan {
    /// Row selection driving the aggregation
    pub read: ReadPlan,
    /// Count all matching rows
    pub count_all: bool,
    /// Fields to take minima of
    pub min: Vec<String>,
    /// Fields to take maxima of
    pub max: Vec<String>,
    /// Fields to average
    pub avg: Vec<String>,
    /// Fields to sum
    pub sum: Vec<String>,
}

impl AggregatePlan {
    /// Renders the requested aggregate expressions
    fn aggregate_columns(&self) -> Vec<String> {
        let mut cols = Vec::new();
        if self.count_all {
            cols.push("COUNT(*)".to_string());
        }
        for field in &self.min {
            cols.push(format!("MIN({})", field));
        }
        for field in &self.max {
            cols.push(format!("MAX({})", field));
        }
        for field in &self.avg {
            cols.push(format!("AVG({})", field));
        }
        for field in &self.sum {
            cols.push(format!("SUM({})", field));
        }
        cols
    }

    /// Renders the statement for tracing
    pub fn statement(&self) -> String {
        let mut stmt = format!(
            "SELECT {} FROM {}",
            self.aggregate_columns().join(", "),
            self.read.table
        );
        push_where(&mut stmt, &self.read.filter);
        stmt
    }
}

/// Plan for a grouped aggregate with a having filter
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByPlan {
    /// Aggregates computed per group
    pub aggregate: AggregatePlan,
    /// Grouping key fields
    pub by: Vec<String>,
    /// Conditions over computed aggregates, all of which must hold
    pub having: Vec<HavingCondition>,
}

impl GroupByPlan {
    /// Renders the statement for tracing
    pub fn statement(&self) -> String {
        let mut columns: Vec<String> = self.by.clone();
        columns.extend(self.aggregate.aggregate_columns());
        let mut stmt = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.aggregate.read.table
        );
        push_where(&mut stmt, &self.aggregate.read.filter);
        stmt.push_str(" GROUP BY ");
        stmt.push_str(&self.by.join(", "));
        if !self.having.is_empty() {
            let conditions: Vec<String> = self
                .having
                .iter()
                .map(|c| {
                    render_condition(
                        &format!("{}({})", c.func.sql_name(), c.field),
                        &c.op,
                    )
                })
                .collect();
            stmt.push_str(" HAVING ");
            stmt.push_str(&conditions.join(" AND "));
        }
        stmt
    }
}

fn push_where(stmt: &mut String, filter: &Filter) {
    if filter.is_empty() {
        return;
    }
    let conditions: Vec<String> = filter
        .predicates
        .iter()
        .map(render_predicate)
        .collect();
    stmt.push_str(" WHERE ");
    stmt.push_str(&conditions.join(" AND "));
}

fn render_predicate(predicate: &Predicate) -> String {
    render_condition(&predicate.field, &predicate.op)
}

fn render_condition(lhs: &str, op: &FilterOp) -> String {
    match op {
        FilterOp::Eq(v) => format!("{} = {}", lhs, render_value(v)),
        FilterOp::Contains(s) => format!("{} LIKE {}", lhs, render_string(&format!("%{}%", s))),
        FilterOp::EndsWith(s) => format!("{} LIKE {}", lhs, render_string(&format!("%{}", s))),
        FilterOp::Gt(v) => format!("{} > {}", lhs, render_value(v)),
        FilterOp::Lte(v) => format!("{} <= {}", lhs, render_value(v)),
        FilterOp::In(values) => {
            let rendered: Vec<String> = values.iter().map(render_value).collect();
            format!("{} IN ({})", lhs, rendered.join(", "))
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => render_string(s),
        other => other.to_string(),
    }
}

fn render_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
