//! In-memory reference backend
//!
//! Rows live in a single table guarded by an async mutex. A transaction
//! holds the table's owned guard for its whole lifetime and stages
//! writes against a snapshot copy, publishing them on commit. Holding
//! the guard serializes the transaction against every other read,
//! write, and transaction, so a check-then-act sequence such as upsert
//! observes no interleaved writer.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::entity::EntityMeta;
use crate::filter::{Filter, PredicateFilter, Row};
use crate::planner::{ReadPlan, WritePlan};

use super::backend::{StorageBackend, StorageTransaction, WriteOutcome};
use super::errors::{StorageError, StorageResult};

#[derive(Debug, Clone)]
struct TableState {
    next_id: i64,
    rows: Vec<Row>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

/// In-process storage backend over one table
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    table: String,
    primary_key: String,
    state: Arc<Mutex<TableState>>,
}

impl MemoryBackend {
    /// Creates an empty backend for the entity's table
    pub fn new(meta: &EntityMeta) -> Self {
        Self {
            table: meta.table().to_string(),
            primary_key: meta.primary_key().to_string(),
            state: Arc::new(Mutex::new(TableState::default())),
        }
    }

    /// Inserts rows directly, bypassing planning. Intended for test and
    /// fixture setup; the same uniqueness rules apply.
    pub async fn seed(&self, rows: impl IntoIterator<Item = Value>) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        for value in rows {
            let row = match value {
                Value::Object(map) => map,
                other => {
                    return Err(StorageError::write_failed(format!(
                        "seed rows must be objects, got {}",
                        other
                    )))
                }
            };
            insert_row(&mut state, &self.primary_key, row)?;
        }
        Ok(())
    }

    /// Returns a copy of every stored row, in primary-key order
    pub async fn rows(&self) -> Vec<Row> {
        self.state.lock().await.rows.clone()
    }

    fn check_table(&self, table: &str) -> StorageResult<()> {
        if self.table == table {
            Ok(())
        } else {
            Err(StorageError::unknown_table(table))
        }
    }
}

impl StorageBackend for MemoryBackend {
    type Txn = MemoryTransaction;

    async fn execute_read(&self, plan: &ReadPlan) -> StorageResult<Vec<Row>> {
        self.check_table(&plan.table)?;
        let state = self.state.lock().await;
        Ok(read_rows(&state, &plan.filter))
    }

    async fn execute_write(&self, plan: &WritePlan) -> StorageResult<WriteOutcome> {
        self.check_table(plan.table())?;
        let mut state = self.state.lock().await;
        apply_write(&mut state, &self.primary_key, plan)
    }

    async fn begin(&self) -> StorageResult<Self::Txn> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryTransaction {
            table: self.table.clone(),
            primary_key: self.primary_key.clone(),
            working,
            guard,
        })
    }
}

/// A snapshot transaction holding the table's write guard
pub struct MemoryTransaction {
    table: String,
    primary_key: String,
    working: TableState,
    guard: OwnedMutexGuard<TableState>,
}

impl MemoryTransaction {
    fn check_table(&self, table: &str) -> StorageResult<()> {
        if self.table == table {
            Ok(())
        } else {
            Err(StorageError::unknown_table(table))
        }
    }
}

impl StorageTransaction for MemoryTransaction {
    async fn read(&mut self, plan: &ReadPlan) -> StorageResult<Vec<Row>> {
        self.check_table(&plan.table)?;
        Ok(read_rows(&self.working, &plan.filter))
    }

    async fn write(&mut self, plan: &WritePlan) -> StorageResult<WriteOutcome> {
        self.check_table(plan.table())?;
        apply_write(&mut self.working, &self.primary_key, plan)
    }

    async fn commit(self) -> StorageResult<()> {
        let MemoryTransaction {
            working, mut guard, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> StorageResult<()> {
        // Dropping the guard discards the staged copy
        Ok(())
    }
}

fn read_rows(state: &TableState, filter: &Filter) -> Vec<Row> {
    state
        .rows
        .iter()
        .filter(|row| PredicateFilter::matches(row, filter))
        .cloned()
        .collect()
}

fn apply_write(state: &mut TableState, pk: &str, plan: &WritePlan) -> StorageResult<WriteOutcome> {
    match plan {
        WritePlan::Insert { row, .. } => {
            insert_row(state, pk, row.clone()).map(WriteOutcome::Row)
        }
        WritePlan::Update {
            filter, changes, ..
        } => {
            let mut affected = 0;
            for row in state.rows.iter_mut() {
                if PredicateFilter::matches(row, filter) {
                    for (field, value) in changes {
                        row.insert(field.clone(), value.clone());
                    }
                    affected += 1;
                }
            }
            Ok(WriteOutcome::Affected(affected))
        }
        WritePlan::Delete { filter, .. } => {
            let before = state.rows.len();
            state.rows.retain(|row| !PredicateFilter::matches(row, filter));
            Ok(WriteOutcome::Affected((before - state.rows.len()) as u64))
        }
    }
}

fn insert_row(state: &mut TableState, pk: &str, mut row: Row) -> StorageResult<Row> {
    let key = row.get(pk).cloned();
    match key {
        None | Some(Value::Null) => {
            let id = state.next_id;
            state.next_id += 1;
            row.insert(pk.to_string(), Value::from(id));
        }
        Some(value) => {
            if state.rows.iter().any(|r| r.get(pk) == Some(&value)) {
                return Err(StorageError::unique_constraint(pk, &value));
            }
            // Keep assigned ids ahead of explicit ones
            if let Some(id) = value.as_i64() {
                if id >= state.next_id {
                    state.next_id = id + 1;
                }
            }
        }
    }
    state.rows.push(row.clone());
    Ok(row)
}
