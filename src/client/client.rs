//! The typed client
//!
//! One async method per access pattern over a single entity. Each call
//! is an independent unit of work: compile the filter, build a plan,
//! execute it, map the result. Every call carries a fresh trace id
//! through the query log. Errors surface to the caller unconverted into
//! retries; only `Transient` is safe to retry.

use serde_json::Value;
use uuid::Uuid;

use crate::entity::EntityMeta;
use crate::errors::{QueryError, QueryResult};
use crate::executor::{AggregateRow, Executor, GroupRow, Record, Records};
use crate::filter::{Filter, FilterCompiler};
use crate::observability::QueryLog;
use crate::planner::{AggregateSpec, Projection, QueryPlanner, QuerySpec, UniqueKey};
use crate::storage::{MemoryBackend, StorageBackend};

use super::options::ClientOptions;

/// A typed query client over one entity and one storage backend.
///
/// The client owns its backend and logger; construct it at startup and
/// drop it at shutdown. All methods take `&self` and may be called
/// concurrently; operations only serialize at the backend when they
/// contend for the same table.
pub struct Client<B: StorageBackend> {
    planner: QueryPlanner,
    backend: B,
    log: QueryLog,
}

impl Client<MemoryBackend> {
    /// Creates a client over a fresh in-memory backend
    pub fn in_memory(meta: EntityMeta, options: ClientOptions) -> Self {
        let backend = MemoryBackend::new(&meta);
        Self::new(meta, backend, options)
    }
}

impl<B: StorageBackend> Client<B> {
    /// Creates a client over an existing backend
    pub fn new(meta: EntityMeta, backend: B, options: ClientOptions) -> Self {
        let log = QueryLog::new(options.log_level);
        log.info("client_initialized", &[("entity", meta.entity())]);
        Self {
            planner: QueryPlanner::new(meta),
            backend,
            log,
        }
    }

    /// Returns the entity metadata
    pub fn meta(&self) -> &EntityMeta {
        self.planner.meta()
    }

    /// Returns the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Looks up at most one record by a unique key.
    ///
    /// Returns None when no row matches; this is not an error.
    pub async fn find_unique(&self, key: &UniqueKey) -> QueryResult<Option<Record>> {
        let trace = new_trace();
        let plan = self.planner.plan_unique(key)?;
        let rows = self.executor().read(&plan, None, &trace).await?;
        Ok(rows.first().and_then(Record::from_row))
    }

    /// Looks up exactly one record by a unique key, failing with
    /// [`QueryError::NotFound`] when no row matches.
    pub async fn find_unique_or_throw(&self, key: &UniqueKey) -> QueryResult<Record> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| QueryError::not_found(self.meta().entity(), &key.field))
    }

    /// Returns the matching records as a lazy, finite, non-restartable
    /// sequence. Ordering applies before the skip/take window, and the
    /// window before projection.
    pub async fn find_many(&self, spec: &QuerySpec) -> QueryResult<Records> {
        let trace = new_trace();
        let filter = self.compile(spec.filter.as_ref())?;
        let plan = self.planner.plan_read(spec, filter)?;
        let rows = self
            .executor()
            .read(&plan, spec.select.as_ref(), &trace)
            .await?;
        Ok(Records::new(rows))
    }

    /// Returns the first matching record: `find_many` with `take = 1`
    pub async fn find_first(&self, spec: &QuerySpec) -> QueryResult<Option<Record>> {
        let mut spec = spec.clone();
        spec.take = Some(1);
        Ok(self.find_many(&spec).await?.next())
    }

    /// Inserts one record and returns it, projected.
    ///
    /// The primary key may be omitted from `data`; an explicit value
    /// that collides fails with [`QueryError::UniqueConstraint`].
    pub async fn create(&self, data: Value, select: Option<Projection>) -> QueryResult<Record> {
        let trace = new_trace();
        self.planner.validate_projection(select.as_ref())?;
        let plan = self.planner.plan_insert(&data)?;
        let row = self.executor().insert(&plan, select.as_ref(), &trace).await?;
        Record::from_row(&row).ok_or_else(unmappable)
    }

    /// Updates the record a unique key targets and returns it,
    /// projected. Fails with [`QueryError::NotFound`] when the key
    /// targets no row; nothing is applied in that case.
    pub async fn update(
        &self,
        key: &UniqueKey,
        data: Value,
        select: Option<Projection>,
    ) -> QueryResult<Record> {
        let trace = new_trace();
        self.planner.validate_projection(select.as_ref())?;
        let lookup = self.planner.plan_unique(key)?;
        let update = self.planner.plan_update(lookup.filter.clone(), &data)?;
        let row = self
            .executor()
            .update_returning(&lookup, &update, select.as_ref(), &trace)
            .await?
            .ok_or_else(|| QueryError::not_found(self.meta().entity(), &key.field))?;
        Record::from_row(&row).ok_or_else(unmappable)
    }

    /// Applies changes to every record matching the filter and returns
    /// the affected count. Zero matches is not an error.
    pub async fn update_many(&self, filter: Value, data: Value) -> QueryResult<u64> {
        let trace = new_trace();
        let compiled = self.compile(Some(&filter))?;
        let plan = self.planner.plan_update(compiled, &data)?;
        Ok(self.executor().write_many(&plan, &trace).await?)
    }

    /// Creates the record if the key targets no row, updates it
    /// otherwise, and returns the resulting record.
    ///
    /// The whole operation is one transaction: concurrent upserts on
    /// the same key serialize at the backend, and a transaction abort
    /// surfaces as [`QueryError::Transient`] with no partial effect.
    pub async fn upsert(
        &self,
        key: &UniqueKey,
        create_data: Value,
        update_data: Value,
    ) -> QueryResult<Record> {
        let trace = new_trace();
        let lookup = self.planner.plan_unique(key)?;
        let update = self.planner.plan_update(lookup.filter.clone(), &update_data)?;
        let insert = self.planner.plan_insert(&create_data)?;
        let row = self
            .executor()
            .upsert(&lookup, &update, &insert, &trace)
            .await?;
        Record::from_row(&row).ok_or_else(unmappable)
    }

    /// Deletes the record a unique key targets and returns it. Fails
    /// with [`QueryError::NotFound`] when the key targets no row.
    pub async fn delete(&self, key: &UniqueKey) -> QueryResult<Record> {
        let trace = new_trace();
        let lookup = self.planner.plan_unique(key)?;
        let delete = self.planner.plan_delete(lookup.filter.clone())?;
        let row = self
            .executor()
            .delete_returning(&lookup, &delete, &trace)
            .await?
            .ok_or_else(|| QueryError::not_found(self.meta().entity(), &key.field))?;
        Record::from_row(&row).ok_or_else(unmappable)
    }

    /// Deletes every record matching the filter and returns the
    /// affected count. Zero matches is not an error.
    pub async fn delete_many(&self, filter: Value) -> QueryResult<u64> {
        let trace = new_trace();
        let compiled = self.compile(Some(&filter))?;
        let plan = self.planner.plan_delete(compiled)?;
        Ok(self.executor().write_many(&plan, &trace).await?)
    }

    /// Counts matching records after the predicate and window.
    ///
    /// A spec without a window counts the full matching subset.
    pub async fn count(&self, spec: &QuerySpec) -> QueryResult<u64> {
        let trace = new_trace();
        let filter = self.compile(spec.filter.as_ref())?;
        let plan = self.planner.plan_read(spec, filter)?;
        Ok(self.executor().count(&plan, &trace).await?)
    }

    /// Computes the requested scalar aggregates over matching records.
    ///
    /// Fields with no contributing rows yield null; a requested count
    /// yields 0.
    pub async fn aggregate(&self, spec: &AggregateSpec) -> QueryResult<AggregateRow> {
        let trace = new_trace();
        let filter = self.compile(spec.query.filter.as_ref())?;
        let plan = self.planner.plan_aggregate(spec, filter)?;
        Ok(self.executor().aggregate(&plan, &trace).await?)
    }

    /// Partitions matching records by the grouping keys, computes
    /// per-group aggregates, and applies the having filter over those
    /// aggregates. Groups with no rows are never emitted.
    pub async fn group_by(&self, spec: &AggregateSpec) -> QueryResult<Vec<GroupRow>> {
        let trace = new_trace();
        let filter = self.compile(spec.query.filter.as_ref())?;
        let plan = self.planner.plan_group_by(spec, filter)?;
        Ok(self.executor().group_by(&plan, &trace).await?)
    }

    fn executor(&self) -> Executor<'_, B> {
        Executor::new(&self.backend, &self.log, self.planner.meta().primary_key())
    }

    fn compile(&self, expr: Option<&Value>) -> QueryResult<Filter> {
        match expr {
            None => Ok(Filter::empty()),
            Some(expr) => Ok(FilterCompiler::new(self.planner.meta()).compile(expr)?),
        }
    }
}

fn new_trace() -> String {
    Uuid::new_v4().to_string()
}

fn unmappable() -> QueryError {
    QueryError::Transient("backend returned an unmappable row".into())
}
