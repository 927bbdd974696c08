//! Static entity metadata
//!
//! Declares the fields an entity exposes to the query layer. Filters,
//! projections, orderings, and write payloads are validated against this
//! metadata when plans are built, never at execution time.

mod types;

pub use types::{EntityMeta, FieldDef, FieldType};
