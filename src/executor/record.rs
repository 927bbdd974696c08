//! Typed records and the result sequence
//!
//! Rows cross the storage boundary as JSON objects; the result mapper
//! turns them into [`Record`] values after projection. A field trimmed
//! away by the projection and a stored null both map to `None`; the
//! primary key is always present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::Row;

/// One typed row of the canonical entity.
///
/// Values are independent copies; mutating a record never touches the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, always present
    pub id: i64,
    /// Display name; None when projected away
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address; None when projected away
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Age; optional in the data model itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl Record {
    /// Maps a projected row into a typed record.
    ///
    /// Returns None for rows that do not carry a usable primary key;
    /// such rows indicate a backend contract violation and are skipped
    /// by the result sequence.
    pub fn from_row(row: &Row) -> Option<Record> {
        serde_json::from_value(Value::Object(row.clone())).ok()
    }
}

/// A lazy, finite, non-restartable sequence of records.
///
/// Rows are fetched at the backend boundary; mapping into [`Record`]
/// happens as the sequence is consumed. Once consumed it cannot be
/// restarted; re-run the query instead.
#[derive(Debug)]
pub struct Records {
    inner: std::vec::IntoIter<Row>,
}

impl Records {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self {
            inner: rows.into_iter(),
        }
    }

    /// Consumes the sequence, yielding the raw projected rows instead
    /// of typed records
    pub fn into_rows(self) -> std::vec::IntoIter<Row> {
        self.inner
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let row = self.inner.next()?;
            if let Some(record) = Record::from_row(&row) {
                return Some(record);
            }
            // Unmappable row, skip
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}
