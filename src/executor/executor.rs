//! Plan execution against a storage backend
//!
//! Execution flow for reads (strict order):
//! 1. Fetch matching rows from the backend
//! 2. Apply sort (if specified)
//! 3. Apply the skip/take window
//! 4. Apply projection
//! 5. Map to records (caller's concern)
//!
//! Multi-step writes (update, upsert, delete returning the removed row)
//! run inside one transaction so partial application is never observed.
//! Every issued statement is logged at query level with the operation's
//! trace id.

use crate::filter::{Filter, Predicate, Row};
use crate::observability::QueryLog;
use crate::planner::{AggregatePlan, GroupByPlan, Projection, ReadPlan, WritePlan};
use crate::storage::{StorageBackend, StorageError, StorageResult, StorageTransaction};

use super::aggregate::{AggregateRow, Aggregator, GroupRow};
use super::project::Projector;
use super::sorter::RowSorter;

/// Executes plans against a backend, mapping rows on the way out
pub struct Executor<'a, B: StorageBackend> {
    backend: &'a B,
    log: &'a QueryLog,
    primary_key: &'a str,
}

impl<'a, B: StorageBackend> Executor<'a, B> {
    /// Creates an executor over a backend
    pub fn new(backend: &'a B, log: &'a QueryLog, primary_key: &'a str) -> Self {
        Self {
            backend,
            log,
            primary_key,
        }
    }

    /// Executes a read plan: fetch, order, window, project.
    pub async fn read(
        &self,
        plan: &ReadPlan,
        projection: Option<&Projection>,
        trace: &str,
    ) -> StorageResult<Vec<Row>> {
        let rows = self.fetch(plan, trace).await?;
        Ok(Projector::apply(rows, projection, self.primary_key))
    }

    /// Counts rows matching the plan, after its window
    pub async fn count(&self, plan: &ReadPlan, trace: &str) -> StorageResult<u64> {
        let rows = self.fetch(plan, trace).await?;
        Ok(rows.len() as u64)
    }

    /// Computes scalar aggregates over the matching rows
    pub async fn aggregate(
        &self,
        plan: &AggregatePlan,
        trace: &str,
    ) -> StorageResult<AggregateRow> {
        self.log.query(trace, &plan.statement());
        let mut rows = self.backend.execute_read(&plan.read).await?;
        Self::order_and_window(&mut rows, &plan.read);
        Ok(Aggregator::aggregate(&rows, plan))
    }

    /// Computes grouped aggregates with their having filter
    pub async fn group_by(
        &self,
        plan: &GroupByPlan,
        trace: &str,
    ) -> StorageResult<Vec<GroupRow>> {
        self.log.query(trace, &plan.statement());
        let mut rows = self.backend.execute_read(&plan.aggregate.read).await?;
        Self::order_and_window(&mut rows, &plan.aggregate.read);
        Ok(Aggregator::group_by(&rows, plan))
    }

    /// Executes a single-row insert, returning the stored row projected
    pub async fn insert(
        &self,
        plan: &WritePlan,
        projection: Option<&Projection>,
        trace: &str,
    ) -> StorageResult<Row> {
        self.log.query(trace, &plan.statement());
        let outcome = self.backend.execute_write(plan).await?;
        let row = outcome
            .into_row()
            .ok_or_else(|| StorageError::write_failed("insert produced no row"))?;
        Ok(Projector::apply_one(row, projection, self.primary_key))
    }

    /// Executes a bulk write (update-many, delete-many), returning the
    /// affected count. Zero matches is not an error.
    pub async fn write_many(&self, plan: &WritePlan, trace: &str) -> StorageResult<u64> {
        self.log.query(trace, &plan.statement());
        let outcome = self.backend.execute_write(plan).await?;
        Ok(outcome.affected())
    }

    /// Updates the row a unique lookup targets and returns it, read
    /// back inside the same transaction. Returns None (after rollback)
    /// when the lookup matches nothing.
    pub async fn update_returning(
        &self,
        lookup: &ReadPlan,
        update: &WritePlan,
        projection: Option<&Projection>,
        trace: &str,
    ) -> StorageResult<Option<Row>> {
        let mut txn = self.begin(trace).await?;
        let result = self.run_update(&mut txn, lookup, update, trace).await;
        let row = self.finish(txn, result, trace).await?;
        Ok(row.map(|row| Projector::apply_one(row, projection, self.primary_key)))
    }

    /// Deletes the row a unique lookup targets and returns it. Returns
    /// None (after rollback) when the lookup matches nothing.
    pub async fn delete_returning(
        &self,
        lookup: &ReadPlan,
        delete: &WritePlan,
        trace: &str,
    ) -> StorageResult<Option<Row>> {
        let mut txn = self.begin(trace).await?;
        let result = self.run_delete(&mut txn, lookup, delete, trace).await;
        self.finish(txn, result, trace).await
    }

    /// Creates or updates the row a unique lookup targets, atomically.
    ///
    /// Lookup, branch, write, and read-back all happen inside one
    /// transaction; a concurrent writer can never observe the row
    /// absent mid-operation.
    pub async fn upsert(
        &self,
        lookup: &ReadPlan,
        update: &WritePlan,
        insert: &WritePlan,
        trace: &str,
    ) -> StorageResult<Row> {
        let mut txn = self.begin(trace).await?;
        let result = self
            .run_upsert(&mut txn, lookup, update, insert, trace)
            .await
            .map(Some);
        let row = self.finish(txn, result, trace).await?;
        row.ok_or_else(|| StorageError::write_failed("upsert produced no row"))
    }

    async fn fetch(&self, plan: &ReadPlan, trace: &str) -> StorageResult<Vec<Row>> {
        self.log.query(trace, &plan.statement());
        let mut rows = self.backend.execute_read(plan).await?;
        Self::order_and_window(&mut rows, plan);
        Ok(rows)
    }

    fn order_and_window(rows: &mut Vec<Row>, plan: &ReadPlan) {
        if let Some(sort) = &plan.order_by {
            RowSorter::sort(rows, sort);
        }
        if plan.skip > 0 {
            let skip = (plan.skip as usize).min(rows.len());
            rows.drain(..skip);
        }
        if let Some(take) = plan.take {
            rows.truncate(take as usize);
        }
    }

    async fn begin(&self, trace: &str) -> StorageResult<B::Txn> {
        self.log.query(trace, "BEGIN");
        self.backend.begin().await
    }

    /// Commits on a successful result, rolls back otherwise
    async fn finish(
        &self,
        txn: B::Txn,
        result: StorageResult<Option<Row>>,
        trace: &str,
    ) -> StorageResult<Option<Row>> {
        match result {
            Ok(Some(row)) => {
                txn.commit().await?;
                self.log.query(trace, "COMMIT");
                Ok(Some(row))
            }
            Ok(None) => {
                txn.rollback().await?;
                self.log.query(trace, "ROLLBACK");
                Ok(None)
            }
            Err(err) => {
                let _ = txn.rollback().await;
                self.log.query(trace, "ROLLBACK");
                Err(err)
            }
        }
    }

    /// Builds a primary-key read-back plan for a row just written.
    ///
    /// The original lookup filter cannot be reused: an update may have
    /// changed the very field the lookup keyed on.
    fn read_back(&self, lookup: &ReadPlan, row: &Row) -> ReadPlan {
        match row.get(self.primary_key) {
            Some(key) => ReadPlan {
                table: lookup.table.clone(),
                filter: Filter::empty().and(Predicate::eq(self.primary_key, key.clone())),
                order_by: None,
                skip: 0,
                take: Some(1),
            },
            None => lookup.clone(),
        }
    }

    async fn run_update(
        &self,
        txn: &mut B::Txn,
        lookup: &ReadPlan,
        update: &WritePlan,
        trace: &str,
    ) -> StorageResult<Option<Row>> {
        self.log.query(trace, &lookup.statement());
        let existing = txn.read(lookup).await?;
        let target = match existing.first() {
            Some(row) => self.read_back(lookup, row),
            None => return Ok(None),
        };
        self.log.query(trace, &update.statement());
        txn.write(update).await?;
        self.log.query(trace, &target.statement());
        let rows = txn.read(&target).await?;
        rows.into_iter()
            .next()
            .map(Some)
            .ok_or_else(|| StorageError::write_failed("updated row disappeared"))
    }

    async fn run_delete(
        &self,
        txn: &mut B::Txn,
        lookup: &ReadPlan,
        delete: &WritePlan,
        trace: &str,
    ) -> StorageResult<Option<Row>> {
        self.log.query(trace, &lookup.statement());
        let mut existing = txn.read(lookup).await?;
        if existing.is_empty() {
            return Ok(None);
        }
        self.log.query(trace, &delete.statement());
        txn.write(delete).await?;
        Ok(Some(existing.remove(0)))
    }

    async fn run_upsert(
        &self,
        txn: &mut B::Txn,
        lookup: &ReadPlan,
        update: &WritePlan,
        insert: &WritePlan,
        trace: &str,
    ) -> StorageResult<Row> {
        self.log.query(trace, &lookup.statement());
        let existing = txn.read(lookup).await?;

        let target = match existing.first() {
            Some(row) => self.read_back(lookup, row),
            None => {
                self.log.query(trace, &insert.statement());
                let outcome = txn.write(insert).await?;
                return outcome
                    .into_row()
                    .ok_or_else(|| StorageError::write_failed("insert produced no row"));
            }
        };

        self.log.query(trace, &update.statement());
        txn.write(update).await?;
        self.log.query(trace, &target.statement());
        let rows = txn.read(&target).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::write_failed("updated row disappeared"))
    }
}
