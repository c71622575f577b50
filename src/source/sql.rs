//! Relational source (SQLite)
//!
//! Opens one connection, executes the declared query once, and streams the
//! result rows. `rusqlite` statements borrow their connection, so the result
//! set is drained into memory at open and the connection is released before
//! the first record is served; the error distinctions of the streaming
//! contract are still kept (open vs execute vs row-step failures).

use std::collections::VecDeque;
use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, KeyValueRecord};
use crate::source::LogicalSource;

/// Streaming source over the rows of one SQL query
pub struct SqlSource {
    rows: VecDeque<KeyValueRecord>,
}

impl SqlSource {
    /// Open a database, run the query, and capture its rows.
    ///
    /// Open failure is `ResourceUnavailable`; a query that fails to prepare
    /// or execute (bad table, bad column) is `Validation`; a failure while
    /// stepping rows is `ResourceUnavailable` with a mid-stream message.
    pub fn open(path: impl AsRef<Path>, query: &str) -> RmlResult<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_connection(&connection, query)
    }

    /// Run the query against an already-open connection
    pub fn from_connection(connection: &Connection, query: &str) -> RmlResult<Self> {
        let mut statement = connection
            .prepare(query)
            .map_err(|e| RmlError::Validation(format!("invalid query `{query}`: {e}")))?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut raw_rows = statement
            .query([])
            .map_err(|e| RmlError::Validation(format!("query execution failed: {e}")))?;

        let mut rows = VecDeque::new();
        loop {
            let row = match raw_rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    return Err(RmlError::ResourceUnavailable(format!(
                        "row fetch failed mid-stream: {e}"
                    )))
                }
            };
            let mut record = KeyValueRecord::new();
            for (i, column) in columns.iter().enumerate() {
                let value = match row.get_ref(i).map_err(|e| {
                    RmlError::ResourceUnavailable(format!("row fetch failed mid-stream: {e}"))
                })? {
                    ValueRef::Null => None,
                    ValueRef::Integer(n) => Some(n.to_string()),
                    ValueRef::Real(f) => Some(f.to_string()),
                    ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                };
                record.insert(column.clone(), value);
            }
            rows.push_back(record);
        }

        debug!(rows = rows.len(), "sql source opened");
        Ok(Self { rows })
    }
}

impl LogicalSource for SqlSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        Ok(self.rows.pop_front().map(DataRecord::Row))
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::Tabular
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE people (id INTEGER, name TEXT, age INTEGER);
                 INSERT INTO people VALUES (1, 'Ann', 62), (2, 'Bob', NULL);",
            )
            .unwrap();
        connection
    }

    fn get<'a>(record: &'a DataRecord, key: &str) -> Option<Option<&'a str>> {
        match record {
            DataRecord::Row(row) => row.get(key).map(|v| v.as_deref()),
            _ => panic!("expected a row record"),
        }
    }

    #[test]
    fn test_streams_rows_in_order() {
        let connection = seeded();
        let mut source =
            SqlSource::from_connection(&connection, "SELECT id, name, age FROM people ORDER BY id")
                .unwrap();

        let first = source.next_record().unwrap().unwrap();
        assert_eq!(get(&first, "id"), Some(Some("1")));
        assert_eq!(get(&first, "name"), Some(Some("Ann")));

        // SQL NULL becomes a present-but-null cell.
        let second = source.next_record().unwrap().unwrap();
        assert_eq!(get(&second, "age"), Some(None));

        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_bad_query_is_validation() {
        let connection = seeded();
        let err =
            SqlSource::from_connection(&connection, "SELECT nope FROM people").err().unwrap();
        assert!(matches!(err, RmlError::Validation(_)));
        let err = SqlSource::from_connection(&connection, "SELECT * FROM missing").err().unwrap();
        assert!(matches!(err, RmlError::Validation(_)));
    }

    #[test]
    fn test_unopenable_database_is_resource_unavailable() {
        let err = SqlSource::open("/no/such/dir/db.sqlite", "SELECT 1").err().unwrap();
        assert!(matches!(err, RmlError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_aliased_columns_name_the_cells() {
        let connection = seeded();
        let mut source = SqlSource::from_connection(
            &connection,
            "SELECT name AS full_name FROM people WHERE id = 1",
        )
        .unwrap();
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(get(&record, "full_name"), Some(Some("Ann")));
    }
}
