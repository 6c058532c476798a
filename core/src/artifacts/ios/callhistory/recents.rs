/**
 * Call recents read from the fixed `fileID` of `CallHistory.storedata`.
 * Records are joined with `ZHANDLE` and the direction comes from `Z_OPT` (2 = in, 1 = out)
 */
use super::{
    error::CallHistoryError,
    records::{call_history, open_call_db, query_records},
};
use crate::{
    artifacts::ios::{addressbook::lookup::ContactLookup, backup::manifest::BackupIndex},
    utils::sqlite::{column_projection, table_columns, value_i64},
};
use common::ios::{CallDirection, CallHistory};
use log::warn;

pub(crate) const CALL_RECENTS_ID: &str = "5a4935c78a5255723f707230a451d79c540d2741";

const RECORD_COLUMNS: [&str; 8] = [
    "Z_PK",
    "Z_OPT",
    "ZANSWERED",
    "ZDATE",
    "ZDURATION",
    "ZADDRESS",
    "ZNAME",
    "ZSERVICE_PROVIDER",
];

/// Get the call recents of the backup
pub fn call_recents(index: &BackupIndex) -> Result<CallHistory, CallHistoryError> {
    let path = match index.resolve_file_id(CALL_RECENTS_ID) {
        Ok(result) => result,
        Err(err) => {
            warn!("[callhistory] Call recents blob not found: {err:?}");
            return Err(CallHistoryError::ArtifactAbsent);
        }
    };
    let (conn, observed) = open_call_db(&path)?;

    let projection = column_projection(&observed, &RECORD_COLUMNS, "c");
    let handles = table_columns(&conn, "ZHANDLE");
    let (handle_column, join) = if handles.contains("ZVALUE") {
        (
            "h.ZVALUE AS ZVALUE",
            " LEFT JOIN ZHANDLE h ON h.Z_PK = c.Z_PK",
        )
    } else {
        ("NULL AS ZVALUE", "")
    };
    let query = format!(
        "SELECT {projection}, {handle_column} FROM ZCALLRECORD c{join} ORDER BY c.ZDATE DESC"
    );

    let lookup = ContactLookup::open(index);
    let records = query_records(
        &conn,
        &query,
        |row| match value_i64(row, "Z_OPT") {
            Some(2) => CallDirection::In,
            Some(1) => CallDirection::Out,
            _ => CallDirection::Unknown,
        },
        lookup.as_ref(),
    )?;
    Ok(call_history(&conn, records))
}
