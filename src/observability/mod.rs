//! Observability
//!
//! Structured, synchronous, one-line JSON logging with a configurable
//! verbosity. Purely observational: disabling it never changes what an
//! operation does.

mod logger;

pub use logger::{LogLevel, QueryLog};
