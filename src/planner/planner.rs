//! Query planner
//!
//! Produces immutable plans from declarative specs. Every spec is
//! validated against the entity metadata before a plan is built, so the
//! executor and backend never see an undeclared field, a mistyped
//! payload, or a unique lookup on a non-unique field.

use serde_json::{Map, Value};

use crate::entity::{EntityMeta, FieldDef, FieldType};
use crate::filter::{Filter, FilterCompiler, FilterOp, Predicate};

use super::aggregate::{AggregateFunc, AggregateSpec, HavingCondition};
use super::errors::{PlannerError, PlannerResult};
use super::plan::{AggregatePlan, GroupByPlan, ReadPlan, WritePlan};
use super::query::{Projection, QuerySpec, UniqueKey};

/// Builds executable plans against one entity's metadata
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    meta: EntityMeta,
}

impl QueryPlanner {
    /// Creates a planner for the given entity
    pub fn new(meta: EntityMeta) -> Self {
        Self { meta }
    }

    /// Returns the entity metadata
    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    /// Plans a windowed read.
    ///
    /// The filter arrives already compiled; this validates the
    /// projection and ordering fields and carries the window through.
    pub fn plan_read(&self, spec: &QuerySpec, filter: Filter) -> PlannerResult<ReadPlan> {
        self.validate_projection(spec.select.as_ref())?;
        if let Some(sort) = &spec.order_by {
            if !self.meta.has_field(&sort.field) {
                return Err(PlannerError::unknown_field(&sort.field, "ordering"));
            }
        }
        Ok(ReadPlan {
            table: self.meta.table().to_string(),
            filter,
            order_by: spec.order_by.clone(),
            skip: spec.skip,
            take: spec.take,
        })
    }

    /// Plans a unique lookup: an equality read with `take = 1`.
    pub fn plan_unique(&self, key: &UniqueKey) -> PlannerResult<ReadPlan> {
        let def = self
            .meta
            .field(&key.field)
            .ok_or_else(|| PlannerError::unknown_field(&key.field, "unique lookup"))?;
        if !self.meta.is_unique(&key.field) {
            return Err(PlannerError::not_unique(&key.field));
        }
        if !def.field_type.accepts(&key.value) {
            return Err(PlannerError::type_mismatch(
                &key.field,
                def.field_type.type_name(),
            ));
        }
        Ok(ReadPlan {
            table: self.meta.table().to_string(),
            filter: Filter::empty().and(Predicate::eq(&key.field, key.value.clone())),
            order_by: None,
            skip: 0,
            take: Some(1),
        })
    }

    /// Plans an insert of one row.
    ///
    /// All payload fields must be declared and typed correctly; required
    /// fields other than the primary key must be present. The primary
    /// key may be omitted, in which case the backend assigns it.
    pub fn plan_insert(&self, data: &Value) -> PlannerResult<WritePlan> {
        let row = self.validate_payload(data)?;
        for field in self.meta.fields() {
            if field.required
                && field.name != self.meta.primary_key()
                && !row.contains_key(&field.name)
            {
                return Err(PlannerError::missing_field(&field.name));
            }
        }
        Ok(WritePlan::Insert {
            table: self.meta.table().to_string(),
            row,
        })
    }

    /// Plans an update of every row matching the filter.
    ///
    /// The primary key is immutable; payloads naming it are rejected.
    pub fn plan_update(&self, filter: Filter, data: &Value) -> PlannerResult<WritePlan> {
        let changes = self.validate_payload(data)?;
        if changes.is_empty() {
            return Err(PlannerError::query_invalid("update payload is empty"));
        }
        if changes.contains_key(self.meta.primary_key()) {
            return Err(PlannerError::immutable_field(self.meta.primary_key()));
        }
        Ok(WritePlan::Update {
            table: self.meta.table().to_string(),
            filter,
            changes,
        })
    }

    /// Plans a delete of every row matching the filter
    pub fn plan_delete(&self, filter: Filter) -> PlannerResult<WritePlan> {
        Ok(WritePlan::Delete {
            table: self.meta.table().to_string(),
            filter,
        })
    }

    /// Plans a scalar aggregate over the matching rows
    pub fn plan_aggregate(
        &self,
        spec: &AggregateSpec,
        filter: Filter,
    ) -> PlannerResult<AggregatePlan> {
        if !spec.requests_any() {
            return Err(PlannerError::query_invalid(
                "aggregate spec requests no aggregates",
            ));
        }
        for field in spec.min.iter().chain(&spec.max) {
            if !self.meta.has_field(field) {
                return Err(PlannerError::unknown_field(field, "aggregate"));
            }
        }
        for field in spec.avg.iter().chain(&spec.sum) {
            let def = self
                .meta
                .field(field)
                .ok_or_else(|| PlannerError::unknown_field(field, "aggregate"))?;
            if !def.field_type.is_numeric() {
                return Err(PlannerError::type_mismatch(field, "numeric field"));
            }
        }
        let read = self.plan_read(&spec.query, filter)?;
        Ok(AggregatePlan {
            read,
            count_all: spec.count_all,
            min: spec.min.clone(),
            max: spec.max.clone(),
            avg: spec.avg.clone(),
            sum: spec.sum.clone(),
        })
    }

    /// Plans a grouped aggregate with its having conditions
    pub fn plan_group_by(
        &self,
        spec: &AggregateSpec,
        filter: Filter,
    ) -> PlannerResult<GroupByPlan> {
        if spec.by.is_empty() {
            return Err(PlannerError::query_invalid(
                "group-by requires at least one grouping key",
            ));
        }
        for field in &spec.by {
            if !self.meta.has_field(field) {
                return Err(PlannerError::unknown_field(field, "grouping"));
            }
        }
        let aggregate = self.plan_aggregate(spec, filter)?;
        let having = match &spec.having {
            Some(expr) => self.compile_having(expr)?,
            None => Vec::new(),
        };
        Ok(GroupByPlan {
            aggregate,
            by: spec.by.clone(),
            having,
        })
    }

    /// Validates a projection against declared fields
    pub fn validate_projection(&self, projection: Option<&Projection>) -> PlannerResult<()> {
        if let Some(projection) = projection {
            for field in projection.fields() {
                if !self.meta.has_field(field) {
                    return Err(PlannerError::unknown_field(field, "projection"));
                }
            }
        }
        Ok(())
    }

    /// Validates a write payload: an object whose entries are declared
    /// fields with correctly typed values (null allowed for optional
    /// fields only).
    fn validate_payload(&self, data: &Value) -> PlannerResult<Map<String, Value>> {
        let entries = data
            .as_object()
            .ok_or_else(|| PlannerError::query_invalid("write payload must be an object"))?;
        for (field, value) in entries {
            let def = self
                .meta
                .field(field)
                .ok_or_else(|| PlannerError::unknown_field(field, "payload"))?;
            if value.is_null() {
                if def.required {
                    return Err(PlannerError::type_mismatch(
                        field,
                        "non-null value for a required field",
                    ));
                }
            } else if !def.field_type.accepts(value) {
                return Err(PlannerError::type_mismatch(
                    field,
                    def.field_type.type_name(),
                ));
            }
        }
        Ok(entries.clone())
    }

    /// Compiles a having expression:
    /// `{"age": {"_avg": {"gt": 2}}}` compiles to one condition
    /// comparing the computed average of `age` against 2.
    fn compile_having(&self, expr: &Value) -> PlannerResult<Vec<HavingCondition>> {
        let entries = expr
            .as_object()
            .ok_or_else(|| PlannerError::having_invalid("having expression must be an object"))?;

        let mut conditions = Vec::new();
        for (field, funcs) in entries {
            let def = self
                .meta
                .field(field)
                .ok_or_else(|| PlannerError::unknown_field(field, "having"))?;
            let funcs = funcs.as_object().ok_or_else(|| {
                PlannerError::having_invalid(format!(
                    "having entry for '{}' must map aggregate functions to comparisons",
                    field
                ))
            })?;
            for (func_key, comparison) in funcs {
                let func = AggregateFunc::from_key(func_key).ok_or_else(|| {
                    PlannerError::having_invalid(format!(
                        "unknown aggregate function '{}' in having",
                        func_key
                    ))
                })?;
                if func.requires_numeric() && !def.field_type.is_numeric() {
                    return Err(PlannerError::type_mismatch(field, "numeric field"));
                }
                conditions.extend(self.compile_having_leaf(def, func, comparison)?);
            }
        }
        Ok(conditions)
    }

    /// Compiles the comparison object of one having entry
    fn compile_having_leaf(
        &self,
        def: &FieldDef,
        func: AggregateFunc,
        comparison: &Value,
    ) -> PlannerResult<Vec<HavingCondition>> {
        let ops = comparison.as_object().ok_or_else(|| {
            PlannerError::having_invalid(format!(
                "having comparison for '{}' must be an operator object",
                def.name
            ))
        })?;

        // The compared value is the aggregate result, not the field:
        // averages and sums of integers compare as floats.
        let result_def = FieldDef {
            name: def.name.clone(),
            field_type: if func.requires_numeric() {
                FieldType::Float
            } else {
                def.field_type
            },
            required: true,
            unique: false,
        };

        let compiler = FilterCompiler::new(&self.meta);
        let mut conditions = Vec::new();
        for (op_name, operand) in ops {
            let op = compiler
                .compile_operator(&result_def, op_name, operand)
                .map_err(|e| PlannerError::having_invalid(e.message().to_string()))?;
            if matches!(op, FilterOp::Contains(_) | FilterOp::EndsWith(_)) {
                return Err(PlannerError::having_invalid(format!(
                    "'{}' cannot be applied to an aggregate",
                    op_name
                )));
            }
            conditions.push(HavingCondition {
                field: def.name.clone(),
                func,
                op,
            });
        }
        Ok(conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::query::SortSpec;
    use serde_json::json;

    fn planner() -> QueryPlanner {
        QueryPlanner::new(EntityMeta::users())
    }

    #[test]
    fn test_plan_read_carries_window() {
        let spec = QuerySpec::new()
            .with_order(SortSpec::desc("name"))
            .with_skip(2)
            .with_take(3);
        let plan = planner().plan_read(&spec, Filter::empty()).unwrap();
        assert_eq!(plan.table, "users");
        assert_eq!(plan.skip, 2);
        assert_eq!(plan.take, Some(3));
    }

    #[test]
    fn test_projection_of_unknown_field_rejected() {
        let spec = QuerySpec::new().with_select(["id", "nickname"]);
        let err = planner().plan_read(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_UNKNOWN_FIELD");
    }

    #[test]
    fn test_ordering_by_unknown_field_rejected() {
        let spec = QuerySpec::new().with_order(SortSpec::asc("created_at"));
        let err = planner().plan_read(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_UNKNOWN_FIELD");
    }

    #[test]
    fn test_plan_unique_on_declared_unique_fields() {
        let plan = planner().plan_unique(&UniqueKey::id(1)).unwrap();
        assert_eq!(plan.take, Some(1));
        assert_eq!(
            plan.filter.predicates,
            vec![Predicate::eq("id", json!(1))]
        );

        assert!(planner().plan_unique(&UniqueKey::email("a@xx.com")).is_ok());
    }

    #[test]
    fn test_plan_unique_rejects_non_unique_field() {
        let err = planner()
            .plan_unique(&UniqueKey::new("name", json!("kk")))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_NOT_UNIQUE");
    }

    #[test]
    fn test_plan_unique_rejects_mistyped_key() {
        let err = planner()
            .plan_unique(&UniqueKey::new("id", json!("one")))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_TYPE_MISMATCH");
    }

    #[test]
    fn test_plan_insert_requires_required_fields() {
        let err = planner()
            .plan_insert(&json!({"name": "kk"}))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_MISSING_FIELD");
        assert_eq!(err.field(), Some("email"));
    }

    #[test]
    fn test_plan_insert_allows_omitted_primary_key() {
        let plan = planner()
            .plan_insert(&json!({"name": "kk", "email": "kk@xx.com"}))
            .unwrap();
        match plan {
            WritePlan::Insert { row, .. } => assert!(!row.contains_key("id")),
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_insert_rejects_undeclared_field() {
        let err = planner()
            .plan_insert(&json!({"name": "kk", "email": "kk@xx.com", "admin": true}))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_UNKNOWN_FIELD");
    }

    #[test]
    fn test_plan_update_rejects_primary_key_change() {
        let err = planner()
            .plan_update(Filter::empty(), &json!({"id": 9}))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_IMMUTABLE_FIELD");
    }

    #[test]
    fn test_plan_update_rejects_empty_payload() {
        let err = planner()
            .plan_update(Filter::empty(), &json!({}))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_INVALID");
    }

    #[test]
    fn test_plan_update_allows_null_for_optional() {
        assert!(planner()
            .plan_update(Filter::empty(), &json!({"age": null}))
            .is_ok());
        let err = planner()
            .plan_update(Filter::empty(), &json!({"name": null}))
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_TYPE_MISMATCH");
    }

    #[test]
    fn test_plan_aggregate_requires_requests() {
        let err = planner()
            .plan_aggregate(&AggregateSpec::new(), Filter::empty())
            .unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_INVALID");
    }

    #[test]
    fn test_plan_aggregate_avg_requires_numeric() {
        let spec = AggregateSpec::new().with_avg("email");
        let err = planner().plan_aggregate(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_TYPE_MISMATCH");
    }

    #[test]
    fn test_plan_group_by_requires_keys() {
        let spec = AggregateSpec::new().with_count();
        let err = planner().plan_group_by(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_INVALID");
    }

    #[test]
    fn test_plan_group_by_compiles_having() {
        let spec = AggregateSpec::new()
            .with_group_by(["email"])
            .with_count()
            .with_sum("age")
            .with_having(json!({"age": {"_avg": {"gt": 2}}}));
        let plan = planner().plan_group_by(&spec, Filter::empty()).unwrap();
        assert_eq!(plan.by, vec!["email".to_string()]);
        assert_eq!(
            plan.having,
            vec![HavingCondition {
                field: "age".into(),
                func: AggregateFunc::Avg,
                op: FilterOp::Gt(json!(2)),
            }]
        );
    }

    #[test]
    fn test_having_unknown_function_rejected() {
        let spec = AggregateSpec::new()
            .with_group_by(["email"])
            .with_count()
            .with_having(json!({"age": {"_median": {"gt": 2}}}));
        let err = planner().plan_group_by(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_HAVING_INVALID");
    }

    #[test]
    fn test_having_string_match_rejected() {
        let spec = AggregateSpec::new()
            .with_group_by(["email"])
            .with_count()
            .with_having(json!({"email": {"_min": {"contains": "xx"}}}));
        let err = planner().plan_group_by(&spec, Filter::empty()).unwrap_err();
        assert_eq!(err.code().code(), "PLINTH_QUERY_HAVING_INVALID");
    }

    #[test]
    fn test_having_avg_accepts_integer_operand() {
        // Averages of int fields compare as floats; an integer operand
        // still compiles.
        let spec = AggregateSpec::new()
            .with_group_by(["email"])
            .with_count()
            .with_having(json!({"age": {"_avg": {"gt": 2}}}));
        assert!(planner().plan_group_by(&spec, Filter::empty()).is_ok());
    }
}
