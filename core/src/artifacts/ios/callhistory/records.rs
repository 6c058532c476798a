/**
 * Shared parsing for both call history variants.
 * Both read `ZCALLRECORD`, they only differ in how the database is located and how direction is stored
 */
use super::{error::CallHistoryError, handle::Decodable};
use crate::{
    artifacts::ios::addressbook::lookup::ContactLookup,
    utils::{
        sqlite::{open_sqlite, table_columns, value_f64, value_i64, value_text},
        strings::normalize_nfc,
        time::convert_date,
    },
};
use common::ios::{CallDirection, CallHistory, CallRecord};
use log::{error, warn};
use rusqlite::{Connection, Row};
use std::{collections::BTreeSet, path::Path};

/// Open a call history database and confirm `ZCALLRECORD` exists
pub(crate) fn open_call_db(
    path: &Path,
) -> Result<(Connection, BTreeSet<String>), CallHistoryError> {
    let conn = match open_sqlite(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[callhistory] Failed to open call history database: {err:?}");
            return Err(CallHistoryError::SqliteParse);
        }
    };
    let columns = table_columns(&conn, "ZCALLRECORD");
    if columns.is_empty() {
        error!("[callhistory] ZCALLRECORD table missing");
        return Err(CallHistoryError::ArtifactAbsent);
    }
    Ok((conn, columns))
}

/// Run a prepared call query and build records
pub(crate) fn query_records(
    conn: &Connection,
    query: &str,
    direction: impl Fn(&Row<'_>) -> CallDirection,
    lookup: Option<&ContactLookup>,
) -> Result<Vec<CallRecord>, CallHistoryError> {
    let mut stmt = match conn.prepare(query) {
        Ok(result) => result,
        Err(err) => {
            error!("[callhistory] Failed to compose call query: {err:?}");
            return Err(CallHistoryError::BadSQL);
        }
    };

    let rows = stmt.query_map([], |row| Ok(call_row(row, &direction)));
    let mut records = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(record) => records.push(record),
                    Err(err) => warn!("[callhistory] Skipping call row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[callhistory] Failed to query calls: {err:?}");
            return Err(CallHistoryError::BadSQL);
        }
    }

    if let Some(contacts) = lookup {
        for record in records.iter_mut() {
            enrich_name(record, contacts);
        }
    }
    Ok(records)
}

fn call_row(row: &Row<'_>, direction: &impl Fn(&Row<'_>) -> CallDirection) -> CallRecord {
    let address = normalize_nfc(&value_text(row, "ZADDRESS"));
    let handle = Decodable::decode(&address);
    let name = normalize_nfc(&value_text(row, "ZNAME"));
    let service = value_text(row, "ZSERVICE_PROVIDER");

    CallRecord {
        pk: value_i64(row, "Z_PK").unwrap_or_default(),
        direction: direction(row),
        answered: value_i64(row, "ZANSWERED").map(|value| value != 0),
        date: value_f64(row, "ZDATE").and_then(convert_date),
        duration: value_f64(row, "ZDURATION").unwrap_or_default(),
        phone_number: if handle.is_wrapped() {
            Some(normalize_nfc(&handle.display()))
        } else {
            None
        },
        address: if address.is_empty() {
            normalize_nfc(&value_text(row, "ZVALUE"))
        } else {
            address
        },
        name: if name.is_empty() { None } else { Some(name) },
        service: if service.is_empty() {
            None
        } else {
            Some(service)
        },
    }
}

/// Fill an empty name from the AddressBook full text index
fn enrich_name(record: &mut CallRecord, lookup: &ContactLookup) {
    if record.name.is_some() {
        return;
    }
    let handle = match &record.phone_number {
        Some(number) => number.as_str(),
        None => record.address.as_str(),
    };
    record.name = lookup.name_for(handle);
}

/// Estimate deleted rows from gaps in the primary key: `max(Z_PK) - count(*)`
pub(crate) fn deleted_estimate(conn: &Connection) -> i64 {
    let result = conn.query_row(
        "SELECT IFNULL(MAX(Z_PK), 0) - COUNT(*) FROM ZCALLRECORD",
        [],
        |row| row.get::<_, i64>(0),
    );
    match result {
        Ok(value) => value.max(0),
        Err(err) => {
            warn!("[callhistory] Could not estimate deleted records: {err:?}");
            0
        }
    }
}

pub(crate) fn call_history(conn: &Connection, records: Vec<CallRecord>) -> CallHistory {
    CallHistory {
        deleted_estimate: deleted_estimate(conn),
        records,
    }
}
