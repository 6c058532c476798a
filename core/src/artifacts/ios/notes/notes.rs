/**
 * Parse the Apple Notes database `NoteStore.sqlite`
 * Notes are rows of `ZICCLOUDSYNCINGOBJECT` with a snippet. The body lives in `ZICNOTEDATA`
 * or in one of the markup/html columns depending on iOS version
 */
use super::{
    body::{clean_text, decode_blob, decode_body},
    error::NotesError,
};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, open_sqlite, table_columns, value_bytes, value_f64, value_text},
        strings::{contains_insensitive, normalize_nfc},
        time::{convert_date, render_kst_opt},
    },
};
use common::ios::{NoteDetail, NoteSummary};
use log::{error, warn};
use rusqlite::{Connection, Row};
use std::collections::BTreeSet;

const NOTE_STORE: [(&str, &str); 1] = [("AppDomainGroup-group.com.apple.notes", "NoteStore.sqlite")];

/// Body candidates in order of preference
const BODY_COLUMNS: [&str; 4] = ["ZMARKUPSTRING", "ZHTMLSTRING1", "ZHTMLSTRING", "ZDATA"];

const NOTE_COLUMNS: [&str; 8] = [
    "ZIDENTIFIER",
    "ZTITLE1",
    "ZTITLE",
    "ZSNIPPET",
    "ZCREATIONDATE1",
    "ZCREATIONDATE3",
    "ZCREATIONDATE",
    "ZMODIFICATIONDATE1",
];

fn open_notes(index: &BackupIndex) -> Result<(Connection, BTreeSet<String>), NotesError> {
    let path = match index.resolve_any(&NOTE_STORE) {
        Ok(result) => result,
        Err(err) => {
            warn!("[notes] NoteStore.sqlite not found: {err:?}");
            return Err(NotesError::ArtifactAbsent);
        }
    };
    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[notes] Failed to open NoteStore.sqlite: {err:?}");
            return Err(NotesError::SqliteParse);
        }
    };
    let columns = table_columns(&conn, "ZICCLOUDSYNCINGOBJECT");
    if !columns.contains("ZSNIPPET") {
        error!("[notes] ZICCLOUDSYNCINGOBJECT table or ZSNIPPET column missing");
        return Err(NotesError::SchemaDrift);
    }
    Ok((conn, columns))
}

/// Note summaries, most recently modified first
pub fn note_summaries(index: &BackupIndex) -> Result<Vec<NoteSummary>, NotesError> {
    let (conn, observed) = open_notes(index)?;
    let projection = column_projection(&observed, &NOTE_COLUMNS, "n");
    let order = if observed.contains("ZMODIFICATIONDATE1") {
        " ORDER BY n.ZMODIFICATIONDATE1 DESC"
    } else {
        ""
    };
    let query = format!(
        "SELECT n.Z_PK AS Z_PK, {projection} FROM ZICCLOUDSYNCINGOBJECT n WHERE n.ZSNIPPET IS NOT NULL{order}"
    );
    query_notes(&conn, &query, summary_row)
}

/// Full note with decoded body
pub fn note_detail(index: &BackupIndex, uuid: &str) -> Result<NoteDetail, NotesError> {
    let details = note_details(index)?;
    match details.into_iter().find(|note| note.summary.uuid == uuid) {
        Some(result) => Ok(result),
        None => Err(NotesError::NoteMissing),
    }
}

/// Every note with its decoded body
pub fn note_details(index: &BackupIndex) -> Result<Vec<NoteDetail>, NotesError> {
    let (conn, observed) = open_notes(index)?;
    let data_columns = table_columns(&conn, "ZICNOTEDATA");
    let has_data = data_columns.contains("ZNOTE");

    let mut projection = vec![column_projection(&observed, &NOTE_COLUMNS, "n")];
    for column in BODY_COLUMNS {
        if observed.contains(column) {
            projection.push(format!("n.\"{column}\" AS \"{column}\""));
        } else if has_data && data_columns.contains(column) {
            projection.push(format!("nd.\"{column}\" AS \"{column}\""));
        } else {
            projection.push(format!("NULL AS \"{column}\""));
        }
    }
    let join = if has_data {
        " LEFT JOIN ZICNOTEDATA nd ON nd.ZNOTE = n.Z_PK"
    } else {
        ""
    };
    let order = if observed.contains("ZMODIFICATIONDATE1") {
        " ORDER BY n.ZMODIFICATIONDATE1 DESC"
    } else {
        ""
    };
    let query = format!(
        "SELECT n.Z_PK AS Z_PK, {} FROM ZICCLOUDSYNCINGOBJECT n{join} WHERE n.ZSNIPPET IS NOT NULL{order}",
        projection.join(", ")
    );

    query_notes(&conn, &query, |row| {
        let summary = summary_row(row)?;
        let content = BODY_COLUMNS
            .iter()
            .filter_map(|column| value_bytes(row, column))
            .find_map(|data| decode_body(&data))
            .unwrap_or_default();
        Ok(NoteDetail {
            summary,
            content: normalize_nfc(&content),
        })
    })
}

/// Notes whose title, snippet or body contain the query
pub fn search_notes(index: &BackupIndex, query: Option<&str>) -> Result<Vec<NoteDetail>, NotesError> {
    let details = note_details(index)?;
    let needle = match query {
        Some(result) => result,
        None => return Ok(details),
    };
    Ok(details
        .into_iter()
        .filter(|note| {
            contains_insensitive(&note.summary.title, needle)
                || contains_insensitive(&note.summary.snippet, needle)
                || contains_insensitive(&note.content, needle)
        })
        .collect())
}

fn query_notes<T>(
    conn: &Connection,
    query: &str,
    map: impl Fn(&Row<'_>) -> Result<T, rusqlite::Error>,
) -> Result<Vec<T>, NotesError> {
    let mut stmt = match conn.prepare(query) {
        Ok(result) => result,
        Err(err) => {
            error!("[notes] Failed to compose notes query: {err:?}");
            return Err(NotesError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| map(row));
    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(result) => results.push(result),
                    Err(err) => warn!("[notes] Skipping note row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[notes] Failed to query notes: {err:?}");
            return Err(NotesError::BadSQL);
        }
    }
    Ok(results)
}

fn summary_row(row: &Row<'_>) -> Result<NoteSummary, rusqlite::Error> {
    let mut title = normalize_nfc(&value_text(row, "ZTITLE1"));
    if title.is_empty() {
        title = normalize_nfc(&value_text(row, "ZTITLE"));
    }
    let snippet = match value_bytes(row, "ZSNIPPET").and_then(|data| decode_blob(&data)) {
        Some(text) => normalize_nfc(&clean_text(&text)),
        None => String::new(),
    };
    let created = ["ZCREATIONDATE1", "ZCREATIONDATE3", "ZCREATIONDATE"]
        .iter()
        .find_map(|column| value_f64(row, column))
        .and_then(convert_date);
    let modified = value_f64(row, "ZMODIFICATIONDATE1").and_then(convert_date);

    let mut uuid = value_text(row, "ZIDENTIFIER");
    if uuid.is_empty() {
        uuid = value_text(row, "Z_PK");
    }

    Ok(NoteSummary {
        uuid,
        title,
        snippet,
        created_kst: render_kst_opt(&created),
        modified_kst: render_kst_opt(&modified),
        created,
        modified,
    })
}
