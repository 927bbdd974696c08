//! Storage backend trait seams
//!
//! The query layer treats storage as an opaque collaborator: it executes
//! read and write plans and opens transactions. Rows cross the boundary
//! as JSON objects; returned rows are independent copies the backend no
//! longer owns.

use serde_json::Value;

use crate::filter::Row;
use crate::planner::{ReadPlan, WritePlan};

use super::errors::StorageResult;

/// Result of one write statement
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The written row (inserts, with backend-assigned key fields)
    Row(Row),
    /// Number of rows the statement touched (updates, deletes)
    Affected(u64),
}

impl WriteOutcome {
    /// Returns the number of rows touched
    pub fn affected(&self) -> u64 {
        match self {
            WriteOutcome::Row(_) => 1,
            WriteOutcome::Affected(n) => *n,
        }
    }

    /// Consumes the outcome, returning the row if one was produced
    pub fn into_row(self) -> Option<Row> {
        match self {
            WriteOutcome::Row(row) => Some(row),
            WriteOutcome::Affected(_) => None,
        }
    }
}

/// An open transaction against a storage backend.
///
/// Reads observe the transaction's own staged writes. Dropping the
/// handle without committing rolls the transaction back.
#[allow(async_fn_in_trait)]
pub trait StorageTransaction {
    /// Executes a read plan inside the transaction
    async fn read(&mut self, plan: &ReadPlan) -> StorageResult<Vec<Row>>;

    /// Executes a write plan inside the transaction
    async fn write(&mut self, plan: &WritePlan) -> StorageResult<WriteOutcome>;

    /// Publishes staged writes atomically
    async fn commit(self) -> StorageResult<()>;

    /// Discards staged writes
    async fn rollback(self) -> StorageResult<()>;
}

/// An opaque storage backend.
///
/// Single-statement operations are implicitly atomic; multi-statement
/// operations go through [`StorageBackend::begin`]. An open transaction
/// serializes with every other write on the same table, so a
/// check-then-act sequence inside one transaction observes no
/// interleaved writer.
#[allow(async_fn_in_trait)]
pub trait StorageBackend {
    /// Transaction handle type
    type Txn: StorageTransaction;

    /// Executes a read plan, returning matching rows in primary-key
    /// order. Ordering, windowing, and projection are the caller's
    /// concern.
    async fn execute_read(&self, plan: &ReadPlan) -> StorageResult<Vec<Row>>;

    /// Executes a single write statement atomically
    async fn execute_write(&self, plan: &WritePlan) -> StorageResult<WriteOutcome>;

    /// Opens a transaction
    async fn begin(&self) -> StorageResult<Self::Txn>;
}

/// Converts a JSON value into a row, rejecting non-objects
pub fn row_from_value(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
