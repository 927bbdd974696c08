//! Execution and result mapping
//!
//! Consumes plans and produces deterministic results: rows are fetched,
//! ordered, windowed, projected, and mapped to typed records, in that
//! order. Multi-step writes run inside one backend transaction.

mod aggregate;
mod executor;
mod project;
mod record;
mod sorter;

pub use aggregate::{AggregateRow, Aggregator, GroupRow};
pub use executor::Executor;
pub use project::Projector;
pub use record::{Record, Records};
pub use sorter::RowSorter;
