use log::{error, warn};
use rusqlite::{types::Value, Connection, OpenFlags, Row};
use std::collections::BTreeSet;
use std::path::Path;

/// Open a SQLITE file read-only. The `immutable` flag bypasses file locks and never creates journal files
pub(crate) fn open_sqlite(path: &Path) -> Result<Connection, rusqlite::Error> {
    let escaped = path
        .display()
        .to_string()
        .replace('%', "%25")
        .replace('?', "%3f")
        .replace('#', "%23")
        .replace(' ', "%20");
    let sqlite_file = format!("file:{escaped}?immutable=1");
    let connection = Connection::open_with_flags(
        sqlite_file,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    );
    match connection {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[sqlite] Failed to open {}: {err:?}", path.display());
            Err(err)
        }
    }
}

/// Get the column names of a table. Empty if the table does not exist
pub(crate) fn table_columns(conn: &Connection, table: &str) -> BTreeSet<String> {
    let mut columns = BTreeSet::new();
    let statement = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"));
    let mut stmt = match statement {
        Ok(result) => result,
        Err(err) => {
            warn!("[sqlite] Could not read schema of {table}: {err:?}");
            return columns;
        }
    };

    let names = stmt.query_map([], |row| row.get::<_, String>(1));
    match names {
        Ok(name_iter) => {
            for name in name_iter.flatten() {
                columns.insert(name);
            }
        }
        Err(err) => warn!("[sqlite] Could not list columns of {table}: {err:?}"),
    }
    columns
}

/// Check if a table exists
pub(crate) fn has_table(conn: &Connection, table: &str) -> bool {
    !table_columns(conn, table).is_empty()
}

/**
 * Build a projection from a declared set of known columns and the columns observed in the table.
 * Known columns that are missing become `NULL AS column` so row lookups by name keep working
 */
pub(crate) fn column_projection(
    observed: &BTreeSet<String>,
    known: &[&str],
    alias: &str,
) -> String {
    let mut projection = Vec::new();
    for column in known {
        if observed.contains(*column) {
            if alias.is_empty() {
                projection.push(format!("\"{column}\""));
            } else {
                projection.push(format!("{alias}.\"{column}\" AS \"{column}\""));
            }
        } else {
            projection.push(format!("NULL AS \"{column}\""));
        }
    }
    projection.join(", ")
}

/// Get a column as text. Numbers are rendered, NULL and blobs become empty
pub(crate) fn value_text(row: &Row<'_>, column: &str) -> String {
    let value: Value = row.get(column).unwrap_or(Value::Null);
    value_to_string(&value)
}

/// Render a SQLITE value as string
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Blob(_) => String::new(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text.clone(),
    }
}

/// Get a column as float. Text that parses as a number is accepted
pub(crate) fn value_f64(row: &Row<'_>, column: &str) -> Option<f64> {
    let value: Value = row.get(column).unwrap_or(Value::Null);
    match value {
        Value::Integer(number) => Some(number as f64),
        Value::Real(number) => Some(number),
        Value::Text(text) => text.trim().parse::<f64>().ok(),
        Value::Null | Value::Blob(_) => None,
    }
}

/// Get a column as raw bytes. Text is returned as its UTF8 bytes
pub(crate) fn value_bytes(row: &Row<'_>, column: &str) -> Option<Vec<u8>> {
    let value: Value = row.get(column).unwrap_or(Value::Null);
    match value {
        Value::Blob(data) => Some(data),
        Value::Text(text) => Some(text.into_bytes()),
        Value::Integer(_) | Value::Real(_) | Value::Null => None,
    }
}

/// Get a column as integer. Floats are truncated
pub(crate) fn value_i64(row: &Row<'_>, column: &str) -> Option<i64> {
    let value: Value = row.get(column).unwrap_or(Value::Null);
    match value {
        Value::Integer(number) => Some(number),
        Value::Real(number) => Some(number as i64),
        Value::Text(text) => text.trim().parse::<i64>().ok(),
        Value::Null | Value::Blob(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{column_projection, has_table, open_sqlite, table_columns, value_f64, value_text};
    use rusqlite::Connection;
    use std::collections::BTreeSet;

    #[test]
    fn test_column_projection() {
        let observed = BTreeSet::from([String::from("ROWID"), String::from("First")]);
        let result = column_projection(&observed, &["ROWID", "First", "Note"], "");
        assert_eq!(result, "\"ROWID\", \"First\", NULL AS \"Note\"");

        let result = column_projection(&observed, &["First"], "p");
        assert_eq!(result, "p.\"First\" AS \"First\"");
    }

    #[test]
    fn test_open_and_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe #1.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE people (ROWID INTEGER PRIMARY KEY, name TEXT, score REAL);
                 INSERT INTO people VALUES (1, 'kim', 2.5);",
            )
            .unwrap();
        }

        let conn = open_sqlite(&path).unwrap();
        let columns = table_columns(&conn, "people");
        assert_eq!(columns.len(), 3);
        assert!(has_table(&conn, "people"));
        assert!(!has_table(&conn, "missing"));

        let mut stmt = conn.prepare("SELECT name, score FROM people").unwrap();
        let values: Vec<(String, Option<f64>)> = stmt
            .query_map([], |row| Ok((value_text(row, "name"), value_f64(row, "score"))))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(values, vec![(String::from("kim"), Some(2.5))]);
    }

    #[test]
    fn test_open_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE t (a INTEGER);").unwrap();
        }
        let conn = open_sqlite(&path).unwrap();
        assert!(conn.execute("INSERT INTO t VALUES (1)", []).is_err());
    }
}
