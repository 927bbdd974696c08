//! Projection application
//!
//! Trims rows to the selected field set. Projection is always the last
//! step of a read path, after ordering and windowing, so ordering by an
//! unselected field still takes effect. The primary key is always
//! retained.

use crate::filter::Row;
use crate::planner::Projection;

/// Applies projections to rows
pub struct Projector;

impl Projector {
    /// Trims one row to the projection, keeping the primary key
    pub fn apply_one(row: Row, projection: Option<&Projection>, primary_key: &str) -> Row {
        match projection {
            None => row,
            Some(projection) => row
                .into_iter()
                .filter(|(field, _)| field == primary_key || projection.contains(field))
                .collect(),
        }
    }

    /// Trims every row to the projection
    pub fn apply(rows: Vec<Row>, projection: Option<&Projection>, primary_key: &str) -> Vec<Row> {
        match projection {
            None => rows,
            Some(_) => rows
                .into_iter()
                .map(|row| Self::apply_one(row, projection, primary_key))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Row {
        json!({"id": 1, "name": "kk", "email": "kk@xx.com", "age": 3})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_no_projection_passes_through() {
        let projected = Projector::apply_one(row(), None, "id");
        assert_eq!(projected.len(), 4);
    }

    #[test]
    fn test_projection_trims_unselected_fields() {
        let projection = Projection::of(["email"]);
        let projected = Projector::apply_one(row(), Some(&projection), "id");
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("id"));
        assert!(projected.contains_key("email"));
        assert!(!projected.contains_key("name"));
    }

    #[test]
    fn test_primary_key_always_retained() {
        let projection = Projection::of(["name"]);
        let projected = Projector::apply_one(row(), Some(&projection), "id");
        assert_eq!(projected["id"], json!(1));
    }

    #[test]
    fn test_apply_to_many() {
        let projection = Projection::of(["id", "email"]);
        let projected = Projector::apply(vec![row(), row()], Some(&projection), "id");
        assert_eq!(projected.len(), 2);
        for row in projected {
            assert_eq!(row.len(), 2);
        }
    }
}
