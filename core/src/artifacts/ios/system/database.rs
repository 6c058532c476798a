use super::error::SystemError;
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::sqlite::{open_sqlite, table_columns},
};
use log::{error, warn};
use rusqlite::{Connection, Row};
use std::collections::BTreeSet;

/// Open a single-table system database and return the observed columns of `table`
pub(crate) fn open_table(
    index: &BackupIndex,
    domain: &str,
    relative_path: &str,
    table: &str,
) -> Result<(Connection, BTreeSet<String>), SystemError> {
    let path = match index.resolve(domain, relative_path) {
        Ok(result) => result,
        Err(err) => {
            warn!("[system] {relative_path} not found: {err:?}");
            return Err(SystemError::ArtifactAbsent);
        }
    };
    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[system] Failed to open {relative_path}: {err:?}");
            return Err(SystemError::SqliteParse);
        }
    };
    let columns = table_columns(&conn, table);
    if columns.is_empty() {
        error!("[system] {relative_path} has no {table} table");
        return Err(SystemError::SchemaDrift);
    }
    Ok((conn, columns))
}

/// Run a query and map every row, skipping rows that fail
pub(crate) fn query_rows<T>(
    conn: &Connection,
    query: &str,
    map: impl Fn(&Row<'_>) -> Result<T, rusqlite::Error>,
) -> Result<Vec<T>, SystemError> {
    let mut stmt = match conn.prepare(query) {
        Ok(result) => result,
        Err(err) => {
            error!("[system] Failed to compose query: {err:?}");
            return Err(SystemError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| map(row));
    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(result) => results.push(result),
                    Err(err) => warn!("[system] Skipping row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[system] Failed to run query: {err:?}");
            return Err(SystemError::BadSQL);
        }
    }
    Ok(results)
}
