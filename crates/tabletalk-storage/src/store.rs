//! Query execution against the data store.

use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use tracing::debug;

use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::frame::{TabularFrame, Value};

use crate::db::Database;

/// Column names plus fully materialized rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn into_frame(self) -> Result<TabularFrame> {
        TabularFrame::from_rows(self.columns, self.rows)
    }
}

/// Anything that can run a statement and hand back its rows.
pub trait DataStore: Send + Sync {
    /// Run one statement. Statements that produce no columns return an
    /// empty `RowSet`.
    fn fetch(&self, sql: &str) -> Result<RowSet>;
}

impl DataStore for Database {
    fn fetch(&self, sql: &str) -> Result<RowSet> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(storage_err)?;

            if stmt.column_count() == 0 {
                let changed = stmt.execute([]).map_err(storage_err)?;
                debug!(changed, "Statement executed without a result set");
                return Ok(RowSet::default());
            }

            let (names, dated): (Vec<String>, Vec<bool>) = stmt
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), c.decl_type().is_some_and(is_date_decl)))
                .unzip();

            let width = names.len();
            let mut rows = Vec::new();
            let mut cursor = stmt.query([]).map_err(storage_err)?;
            while let Some(row) = cursor.next().map_err(storage_err)? {
                let mut values = Vec::with_capacity(width);
                for (idx, is_date) in dated.iter().enumerate() {
                    let raw = row.get_ref(idx).map_err(storage_err)?;
                    values.push(to_value(raw, *is_date));
                }
                rows.push(values);
            }

            debug!(columns = width, rows = rows.len(), "Statement fetched");
            Ok(RowSet {
                columns: names,
                rows,
            })
        })
    }
}

fn storage_err(e: rusqlite::Error) -> TabletalkError {
    TabletalkError::Storage(e.to_string())
}

fn is_date_decl(decl: &str) -> bool {
    let upper = decl.to_ascii_uppercase();
    upper == "DATE" || upper.starts_with("DATETIME") || upper.starts_with("TIMESTAMP")
}

fn to_value(raw: ValueRef<'_>, is_date: bool) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if is_date {
                if let Some(date) = parse_date(&text) {
                    return Value::Date(date);
                }
            }
            Value::Text(text.into_owned())
        }
        ValueRef::Blob(bytes) => Value::Text(format!("<{} bytes>", bytes.len())),
    }
}

/// Parse the leading `YYYY-MM-DD` of a date or datetime string.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletalk_core::frame::ColumnType;

    fn make_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE staff (
                    id INTEGER PRIMARY KEY,
                    name TEXT,
                    salary REAL,
                    hired DATE,
                    photo BLOB
                );
                INSERT INTO staff VALUES (1, 'Ada', 50000.5, '2021-03-04', x'0102');
                INSERT INTO staff VALUES (2, 'Alan', NULL, 'soon', NULL);",
            )
            .map_err(storage_err)
        })
        .unwrap();
        db
    }

    #[test]
    fn test_fetch_maps_types() {
        let db = make_db();
        let set = db.fetch("SELECT * FROM staff ORDER BY id;").unwrap();
        assert_eq!(set.columns, vec!["id", "name", "salary", "hired", "photo"]);
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0][0], Value::Integer(1));
        assert_eq!(set.rows[0][1], Value::Text("Ada".to_string()));
        assert_eq!(set.rows[0][2], Value::Float(50000.5));
        assert_eq!(
            set.rows[0][3],
            Value::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap())
        );
        assert_eq!(set.rows[0][4], Value::Text("<2 bytes>".to_string()));
        assert_eq!(set.rows[1][2], Value::Null);
        // Unparseable date text stays text.
        assert_eq!(set.rows[1][3], Value::Text("soon".to_string()));
    }

    #[test]
    fn test_fetch_into_frame() {
        let db = make_db();
        let frame = db
            .fetch("SELECT id, salary FROM staff ORDER BY id")
            .unwrap()
            .into_frame()
            .unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("id").unwrap().kind(), ColumnType::Integer);
        assert_eq!(frame.column("salary").unwrap().kind(), ColumnType::Float);
    }

    #[test]
    fn test_fetch_expression_columns_have_no_decl_type() {
        let db = make_db();
        let set = db
            .fetch("SELECT name || '!' AS shout, COUNT(*) AS n FROM staff GROUP BY name ORDER BY name")
            .unwrap();
        assert_eq!(set.columns, vec!["shout", "n"]);
        assert_eq!(set.rows[0][0], Value::Text("Ada!".to_string()));
        assert_eq!(set.rows[0][1], Value::Integer(1));
    }

    #[test]
    fn test_fetch_no_rows_keeps_columns() {
        let db = make_db();
        let set = db.fetch("SELECT id FROM staff WHERE id > 100").unwrap();
        assert_eq!(set.columns, vec!["id"]);
        assert!(set.rows.is_empty());
    }

    #[test]
    fn test_fetch_statement_without_columns() {
        let db = make_db();
        let set = db.fetch("UPDATE staff SET salary = 1 WHERE id = 1;").unwrap();
        assert_eq!(set, RowSet::default());
        let check = db.fetch("SELECT salary FROM staff WHERE id = 1").unwrap();
        assert_eq!(check.rows[0][0], Value::Float(1.0));
    }

    #[test]
    fn test_fetch_bad_sql() {
        let db = make_db();
        let err = db.fetch("SELECT nope FROM staff").unwrap_err();
        assert!(matches!(err, TabletalkError::Storage(_)));
    }

    #[test]
    fn test_parse_date_accepts_datetime_prefix() {
        assert_eq!(
            parse_date("2020-01-02 10:00:00"),
            NaiveDate::from_ymd_opt(2020, 1, 2)
        );
        assert_eq!(parse_date("2020"), None);
    }
}
