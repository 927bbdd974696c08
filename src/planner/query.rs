//! Query specification structures
//!
//! A [`QuerySpec`] carries everything a read-path operation needs: a raw
//! filter expression, an optional projection, ordering, and a skip/take
//! window. Specs are built by callers and validated by the planner.

use serde_json::Value;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// The subset of fields returned to the caller.
///
/// The entity's primary key is always retained so every mapped record
/// stays identifiable, whether or not it is listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Creates a projection over the named fields
    pub fn of(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the selected field names
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Checks whether a field is selected
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// A unique-lookup key: a value for a field declared unique.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueKey {
    /// Field name (must be declared unique on the entity)
    pub field: String,
    /// Key value
    pub value: Value,
}

impl UniqueKey {
    /// Creates a key on an arbitrary unique field
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// Creates a primary-key lookup for the canonical entity
    pub fn id(id: i64) -> Self {
        Self::new("id", Value::from(id))
    }

    /// Creates an email lookup for the canonical entity
    pub fn email(email: impl Into<String>) -> Self {
        Self::new("email", Value::from(email.into()))
    }
}

/// Declarative read-query specification.
///
/// `skip` defaults to 0 and `take` to unbounded. Ordering applies before
/// the window, and the window before projection.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Raw filter expression, compiled by the client before planning
    pub filter: Option<Value>,
    /// Projection applied after ordering and windowing
    pub select: Option<Projection>,
    /// Ordering over unprojected rows
    pub order_by: Option<SortSpec>,
    /// Rows to skip from the front of the ordered result
    pub skip: u64,
    /// Maximum rows to return; None = unbounded
    pub take: Option<u64>,
}

impl QuerySpec {
    /// Creates an unconstrained spec (match all, return all)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter expression
    pub fn with_filter(mut self, expr: Value) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Sets the projection
    pub fn with_select(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = Some(Projection::of(fields));
        self
    }

    /// Sets the ordering
    pub fn with_order(mut self, sort: SortSpec) -> Self {
        self.order_by = Some(sort);
        self
    }

    /// Sets the number of rows to skip
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of rows to return
    pub fn with_take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }
}
