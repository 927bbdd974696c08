//! Entity metadata definitions
//!
//! Supported scalar types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//!
//! Metadata is supplied to the planner at construction time; every filter,
//! projection, ordering, grouping key, and unique lookup is validated
//! against it before a plan is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported scalar field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }

    /// Checks whether a JSON value fits this type (no coercion)
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
        }
    }

    /// Returns true if values of this type have a defined ordering
    pub fn is_comparable(&self) -> bool {
        !matches!(self, FieldType::Bool)
    }

    /// Returns true for numeric types
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }
}

/// A single declared field of the entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Scalar type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present and non-null
    pub required: bool,
    /// Whether the field is declared unique (usable as a lookup key)
    pub unique: bool,
}

impl FieldDef {
    /// Create a required string field
    pub fn required_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            required: true,
            unique: false,
        }
    }

    /// Create an optional string field
    pub fn optional_string(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required_string(name)
        }
    }

    /// Create a required int field
    pub fn required_int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Int,
            required: true,
            unique: false,
        }
    }

    /// Create an optional int field
    pub fn optional_int(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required_int(name)
        }
    }

    /// Create a required float field
    pub fn required_float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Float,
            required: true,
            unique: false,
        }
    }

    /// Create a required bool field
    pub fn required_bool(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Bool,
            required: true,
            unique: false,
        }
    }

    /// Marks the field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Static metadata for one entity: name, table, and declared fields.
///
/// The first unique field passed as `primary_key` identifies rows; the
/// backend enforces its uniqueness. Other unique fields are lookup keys
/// by convention only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    entity: String,
    table: String,
    primary_key: String,
    fields: Vec<FieldDef>,
}

impl EntityMeta {
    /// Creates entity metadata.
    ///
    /// `primary_key` must name one of `fields`; it is treated as unique
    /// regardless of its declaration.
    pub fn new(
        entity: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        Self {
            entity: entity.into(),
            table: table.into(),
            primary_key: primary_key.into(),
            fields,
        }
    }

    /// The canonical single-entity schema used throughout the crate's
    /// tests: `users(id, name, email, age)`.
    pub fn users() -> Self {
        Self::new(
            "User",
            "users",
            "id",
            vec![
                FieldDef::required_int("id").unique(),
                FieldDef::required_string("name"),
                FieldDef::required_string("email").unique(),
                FieldDef::optional_int("age"),
            ],
        )
    }

    /// Returns the entity name (used in error messages)
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the backing table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the primary key field name
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Looks up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks if a field is declared
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Checks if a field may key a unique lookup
    pub fn is_unique(&self, name: &str) -> bool {
        name == self.primary_key || self.field(name).is_some_and(|f| f.unique)
    }

    /// Iterates declared field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Iterates declared fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}
