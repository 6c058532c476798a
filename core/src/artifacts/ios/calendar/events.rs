/**
 * Parse the iOS `Calendar.sqlitedb` database
 * Event dates are stored as Apple Absolute seconds. Side tables (alarms, participants,
 * exceptions, recurrences, attachments, locations) reference the event through an owner id
 */
use super::error::CalendarError;
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{
            column_projection, has_table, open_sqlite, table_columns, value_f64, value_i64,
            value_text,
        },
        strings::normalize_nfc,
        time::{convert_date, render_kst_opt, APPLE_EPOCH_OFFSET},
    },
};
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use common::ios::{
    Alarm, Calendar, CalendarAttachment, CalendarEvent, CalendarLocation, ExceptionDate,
    Participant, Recurrence,
};
use log::{error, warn};
use rusqlite::{types::Value, Connection, Row};

const CALENDAR: [(&str, &str); 1] = [("HomeDomain", "Library/Calendar/Calendar.sqlitedb")];

/// Open `Calendar.sqlitedb` from the backup
fn open_calendar(index: &BackupIndex) -> Result<Connection, CalendarError> {
    let path = match index.resolve_any(&CALENDAR) {
        Ok(result) => result,
        Err(err) => {
            warn!("[calendar] Calendar.sqlitedb not found: {err:?}");
            return Err(CalendarError::ArtifactAbsent);
        }
    };
    match open_sqlite(&path) {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[calendar] Failed to open Calendar.sqlitedb: {err:?}");
            Err(CalendarError::SqliteParse)
        }
    }
}

/// Get all calendars
pub fn calendars(index: &BackupIndex) -> Result<Vec<Calendar>, CalendarError> {
    let conn = open_calendar(index)?;
    let observed = table_columns(&conn, "Calendar");
    if observed.is_empty() {
        return Err(CalendarError::SchemaDrift);
    }
    let projection = column_projection(&observed, &["title", "color"], "");
    let query = format!("SELECT ROWID, {projection} FROM Calendar ORDER BY ROWID");

    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[calendar] Failed to compose Calendar query: {err:?}");
            return Err(CalendarError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| {
        Ok(Calendar {
            rowid: row.get("ROWID")?,
            title: normalize_nfc(&value_text(row, "title")),
            color: value_text(row, "color"),
        })
    });
    match rows {
        Ok(row_iter) => Ok(row_iter.flatten().collect()),
        Err(err) => {
            error!("[calendar] Failed to query Calendar: {err:?}");
            Err(CalendarError::BadSQL)
        }
    }
}

/**
 * Get events starting inside `[start, end]`. Either bound may be open.
 * The window is converted to Apple Absolute seconds before comparing with `start_date`
 */
pub fn events(
    index: &BackupIndex,
    start: Option<&DateTime<Utc>>,
    end: Option<&DateTime<Utc>>,
) -> Result<Vec<CalendarEvent>, CalendarError> {
    if let (Some(first), Some(last)) = (start, end) {
        if first > last {
            return Err(CalendarError::BadWindow);
        }
    }

    let conn = open_calendar(index)?;
    let observed = table_columns(&conn, "CalendarItem");
    if observed.is_empty() {
        error!("[calendar] CalendarItem table missing");
        return Err(CalendarError::SchemaDrift);
    }
    let has_calendar = has_table(&conn, "Calendar");

    let item_columns = column_projection(
        &observed,
        &[
            "summary",
            "description",
            "start_date",
            "end_date",
            "all_day",
            "calendar_id",
            "location_id",
        ],
        "i",
    );
    let calendar_columns = if has_calendar {
        "c.title AS calendar_title, c.color AS color"
    } else {
        "NULL AS calendar_title, NULL AS color"
    };
    let join = if has_calendar && observed.contains("calendar_id") {
        " LEFT JOIN Calendar c ON i.calendar_id = c.ROWID"
    } else if has_calendar {
        " LEFT JOIN Calendar c ON 0"
    } else {
        ""
    };

    let mut conditions = Vec::new();
    let mut params = Vec::new();
    if let Some(value) = start {
        conditions.push("i.start_date >= ?");
        params.push(Value::Integer(value.timestamp() - APPLE_EPOCH_OFFSET));
    }
    if let Some(value) = end {
        conditions.push("i.start_date <= ?");
        params.push(Value::Integer(value.timestamp() - APPLE_EPOCH_OFFSET));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "SELECT i.ROWID AS event_id, {item_columns}, {calendar_columns} FROM CalendarItem i{join}{where_clause} ORDER BY i.start_date ASC"
    );

    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[calendar] Failed to compose CalendarItem query: {err:?}");
            return Err(CalendarError::BadSQL);
        }
    };

    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), event_row);
    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(event) => results.push(event),
                    Err(err) => warn!("[calendar] Skipping CalendarItem row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[calendar] Failed to query CalendarItem: {err:?}");
            return Err(CalendarError::BadSQL);
        }
    }

    for event in results.iter_mut() {
        event.alarms = alarms(&conn, event.event_id);
        event.participants = participants(&conn, event.event_id);
        event.exceptions = exceptions(&conn, event.event_id);
        event.recurrences = recurrences(&conn, event.event_id);
        event.attachments = attachments(&conn, event.event_id);
        if let Some(location_id) = event.location_id {
            event.location = location(&conn, location_id);
        }
    }
    Ok(results)
}

/// Get events whose start falls inside a calendar month in KST
pub fn month_events(
    index: &BackupIndex,
    year: i32,
    month: u32,
) -> Result<Vec<CalendarEvent>, CalendarError> {
    let (start, end) = match month_window(year, month) {
        Some(result) => result,
        None => return Err(CalendarError::BadWindow),
    };
    events(index, Some(&start), Some(&end))
}

/// First and last second of a month in KST, as UTC instants
fn month_window(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let kst = FixedOffset::east_opt(9 * 3600)?;
    let start = kst.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if start.month() == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = kst.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    Some((
        start.with_timezone(&Utc),
        (next - chrono::TimeDelta::seconds(1)).with_timezone(&Utc),
    ))
}

fn event_row(row: &Row<'_>) -> Result<CalendarEvent, rusqlite::Error> {
    let start = value_f64(row, "start_date").and_then(convert_date);
    let mut end = value_f64(row, "end_date").and_then(convert_date);
    if let (Some(first), Some(last)) = (start, end) {
        if last < first {
            warn!("[calendar] Event end before start, using start as end");
            end = Some(first);
        }
    }

    Ok(CalendarEvent {
        event_id: row.get("event_id")?,
        summary: normalize_nfc(&value_text(row, "summary")),
        description: normalize_nfc(&value_text(row, "description")),
        start_local: render_kst_opt(&start),
        end_local: render_kst_opt(&end),
        start,
        end,
        all_day: value_i64(row, "all_day").unwrap_or_default() != 0,
        calendar_title: normalize_nfc(&value_text(row, "calendar_title")),
        color: value_text(row, "color"),
        location_id: value_i64(row, "location_id").filter(|id| *id > 0),
        ..Default::default()
    })
}

/// Run a side table query for an owner id. Missing tables or columns return an empty list
fn side_query<T>(
    conn: &Connection,
    query: &str,
    owner_id: i64,
    map: impl Fn(&Row<'_>) -> Result<T, rusqlite::Error>,
) -> Vec<T> {
    let mut stmt = match conn.prepare(query) {
        Ok(result) => result,
        Err(err) => {
            warn!("[calendar] Side table query failed: {err:?}");
            return Vec::new();
        }
    };
    let records = match stmt.query_map([owner_id], |row| map(row)) {
        Ok(rows) => rows.flatten().collect(),
        Err(err) => {
            warn!("[calendar] Side table rows failed: {err:?}");
            Vec::new()
        }
    };
    records
}

/// Alarms of an event joined with the alarm cache for fire dates
pub(crate) fn alarms(conn: &Connection, event_id: i64) -> Vec<Alarm> {
    let observed = table_columns(conn, "Alarm");
    if !observed.contains("calendaritem_owner_id") {
        return Vec::new();
    }
    let columns = column_projection(&observed, &["trigger_date", "trigger_interval"], "a");
    let cache = table_columns(conn, "AlarmCache");
    let (fire_date, join) = if cache.contains("alarm_id") && cache.contains("fire_date") {
        (
            "c.fire_date AS fire_date",
            " LEFT JOIN AlarmCache c ON c.alarm_id = a.ROWID",
        )
    } else {
        ("NULL AS fire_date", "")
    };
    let query = format!(
        "SELECT a.ROWID AS rowid, {columns}, {fire_date} FROM Alarm a{join} WHERE a.calendaritem_owner_id = ? GROUP BY a.ROWID ORDER BY a.ROWID"
    );
    side_query(conn, &query, event_id, |row| {
        Ok(Alarm {
            rowid: row.get("rowid")?,
            trigger_date: value_f64(row, "trigger_date").and_then(convert_date),
            trigger_interval: value_i64(row, "trigger_interval").unwrap_or_default(),
            fire_date: value_f64(row, "fire_date").and_then(convert_date),
        })
    })
}

pub(crate) fn participants(conn: &Connection, event_id: i64) -> Vec<Participant> {
    let observed = table_columns(conn, "Participant");
    if !observed.contains("owner_id") {
        return Vec::new();
    }
    let columns = column_projection(&observed, &["email", "role", "status"], "");
    let query =
        format!("SELECT ROWID AS rowid, {columns} FROM Participant WHERE owner_id = ? ORDER BY ROWID");
    side_query(conn, &query, event_id, |row| {
        Ok(Participant {
            rowid: row.get("rowid")?,
            email: normalize_nfc(&value_text(row, "email")),
            role: value_i64(row, "role").unwrap_or_default(),
            status: value_i64(row, "status").unwrap_or_default(),
        })
    })
}

pub(crate) fn exceptions(conn: &Connection, event_id: i64) -> Vec<ExceptionDate> {
    let observed = table_columns(conn, "ExceptionDate");
    if !observed.contains("owner_id") {
        return Vec::new();
    }
    let columns = column_projection(&observed, &["date"], "");
    let query = format!(
        "SELECT ROWID AS rowid, {columns} FROM ExceptionDate WHERE owner_id = ? ORDER BY ROWID"
    );
    side_query(conn, &query, event_id, |row| {
        Ok(ExceptionDate {
            rowid: row.get("rowid")?,
            date: value_f64(row, "date").and_then(convert_date),
        })
    })
}

pub(crate) fn recurrences(conn: &Connection, event_id: i64) -> Vec<Recurrence> {
    let observed = table_columns(conn, "Recurrence");
    if !observed.contains("owner_id") {
        return Vec::new();
    }
    let columns = column_projection(&observed, &["frequency", "interval", "count", "end_date"], "");
    let query =
        format!("SELECT ROWID AS rowid, {columns} FROM Recurrence WHERE owner_id = ? ORDER BY ROWID");
    side_query(conn, &query, event_id, |row| {
        Ok(Recurrence {
            rowid: row.get("rowid")?,
            frequency: value_i64(row, "frequency").unwrap_or_default(),
            interval: value_i64(row, "interval").unwrap_or_default(),
            count: value_i64(row, "count").unwrap_or_default(),
            end_date: value_f64(row, "end_date").and_then(convert_date),
        })
    })
}

/// Attachments of an event joined with the attachment file metadata
pub(crate) fn attachments(conn: &Connection, event_id: i64) -> Vec<CalendarAttachment> {
    let observed = table_columns(conn, "Attachment");
    if !observed.contains("owner_id") {
        return Vec::new();
    }
    let files = table_columns(conn, "AttachmentFile");
    let query = if observed.contains("file_id") && !files.is_empty() {
        let columns = column_projection(&files, &["filename", "file_size", "url"], "f");
        format!("SELECT a.ROWID AS rowid, {columns} FROM Attachment a LEFT JOIN AttachmentFile f ON a.file_id = f.ROWID WHERE a.owner_id = ? ORDER BY a.ROWID")
    } else {
        let columns = column_projection(&observed, &["filename", "file_size", "url"], "a");
        format!("SELECT a.ROWID AS rowid, {columns} FROM Attachment a WHERE a.owner_id = ? ORDER BY a.ROWID")
    };
    side_query(conn, &query, event_id, |row| {
        Ok(CalendarAttachment {
            rowid: row.get("rowid")?,
            filename: normalize_nfc(&value_text(row, "filename")),
            file_size: value_i64(row, "file_size").unwrap_or_default(),
            url: value_text(row, "url"),
        })
    })
}

pub(crate) fn location(conn: &Connection, location_id: i64) -> Option<CalendarLocation> {
    let observed = table_columns(conn, "Location");
    if observed.is_empty() {
        return None;
    }
    let columns = column_projection(&observed, &["title", "address", "latitude", "longitude"], "");
    let query = format!("SELECT ROWID AS rowid, {columns} FROM Location WHERE ROWID = ?");
    side_query(conn, &query, location_id, |row| {
        Ok(CalendarLocation {
            rowid: row.get("rowid")?,
            title: normalize_nfc(&value_text(row, "title")),
            address: normalize_nfc(&value_text(row, "address")),
            latitude: value_f64(row, "latitude").unwrap_or_default(),
            longitude: value_f64(row, "longitude").unwrap_or_default(),
        })
    })
    .into_iter()
    .next()
}
