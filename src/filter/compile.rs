//! Filter expression compilation
//!
//! Translates a declarative filter expression (a JSON map from field name
//! to either a literal or an operator-keyed object) into a validated
//! [`Filter`]. All validation happens here; evaluation never sees an
//! undeclared field or a mistyped operand.

use serde_json::Value;

use crate::entity::{EntityMeta, FieldDef};

use super::ast::{Filter, FilterOp, Predicate};
use super::errors::{FilterError, FilterResult};

/// Compiles filter expressions against entity metadata
pub struct FilterCompiler<'a> {
    meta: &'a EntityMeta,
}

impl<'a> FilterCompiler<'a> {
    /// Creates a compiler for the given entity
    pub fn new(meta: &'a EntityMeta) -> Self {
        Self { meta }
    }

    /// Compiles a filter expression into a predicate list.
    ///
    /// A bare literal is shorthand for equality:
    /// `{"email": {"contains": "xx"}, "age": 3}` compiles to
    /// `email CONTAINS "xx" AND age = 3`.
    pub fn compile(&self, expr: &Value) -> FilterResult<Filter> {
        let entries = expr
            .as_object()
            .ok_or_else(|| FilterError::malformed("filter expression must be an object"))?;

        let mut predicates = Vec::new();
        for (field, value) in entries {
            let def = self
                .meta
                .field(field)
                .ok_or_else(|| FilterError::unknown_field(field))?;

            match value {
                Value::Object(ops) => {
                    if ops.is_empty() {
                        return Err(FilterError::malformed(format!(
                            "empty operator object for field '{}'",
                            field
                        )));
                    }
                    for (op, operand) in ops {
                        let op = self.compile_operator(def, op, operand)?;
                        predicates.push(Predicate {
                            field: field.clone(),
                            op,
                        });
                    }
                }
                literal => {
                    predicates.push(Predicate::eq(field, self.literal(def, literal)?));
                }
            }
        }
        Ok(Filter::new(predicates))
    }

    /// Compiles one operator application against a declared field.
    ///
    /// Also used by the planner to compile `having` leaves, where the
    /// same operator grammar applies to aggregate results.
    pub(crate) fn compile_operator(
        &self,
        def: &FieldDef,
        op: &str,
        operand: &Value,
    ) -> FilterResult<FilterOp> {
        match op {
            "equals" => Ok(FilterOp::Eq(self.literal(def, operand)?)),
            "contains" => Ok(FilterOp::Contains(self.string_operand(def, op, operand)?)),
            "endsWith" => Ok(FilterOp::EndsWith(self.string_operand(def, op, operand)?)),
            "gt" => Ok(FilterOp::Gt(self.comparable(def, op, operand)?)),
            "lte" => Ok(FilterOp::Lte(self.comparable(def, op, operand)?)),
            "in" => {
                let items = operand.as_array().ok_or_else(|| {
                    FilterError::operand_mismatch(&def.name, "for 'in' must be an array")
                })?;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.literal(def, item)?);
                }
                Ok(FilterOp::In(values))
            }
            other => Err(FilterError::unknown_operator(&def.name, other)),
        }
    }

    /// Validates a literal against the field's declared type.
    ///
    /// Null is accepted only for optional fields.
    fn literal(&self, def: &FieldDef, value: &Value) -> FilterResult<Value> {
        if value.is_null() {
            if def.required {
                return Err(FilterError::operand_mismatch(
                    &def.name,
                    "must not be null for a required field",
                ));
            }
            return Ok(Value::Null);
        }
        if !def.field_type.accepts(value) {
            return Err(FilterError::operand_mismatch(
                &def.name,
                format!("must be a {}", def.field_type.type_name()),
            ));
        }
        Ok(value.clone())
    }

    /// Validates a string-match operand (contains, endsWith)
    fn string_operand(&self, def: &FieldDef, op: &str, operand: &Value) -> FilterResult<String> {
        if !matches!(def.field_type, crate::entity::FieldType::String) {
            return Err(FilterError::operand_mismatch(
                &def.name,
                format!("'{}' applies only to string fields", op),
            ));
        }
        operand
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| FilterError::operand_mismatch(&def.name, "must be a string"))
    }

    /// Validates a comparison operand (gt, lte)
    fn comparable(&self, def: &FieldDef, op: &str, operand: &Value) -> FilterResult<Value> {
        if !def.field_type.is_comparable() {
            return Err(FilterError::operand_mismatch(
                &def.name,
                format!("'{}' applies only to ordered fields", op),
            ));
        }
        let value = self.literal(def, operand)?;
        if value.is_null() {
            return Err(FilterError::operand_mismatch(
                &def.name,
                "must not be null in a comparison",
            ));
        }
        Ok(value)
    }
}
