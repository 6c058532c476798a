/**
 * Call history resolved through the manifest at `Library/CallHistoryDB/CallHistory.storedata`.
 * Direction comes from `ZORIGINATED` (0 = in, 1 = out)
 */
use super::{
    error::CallHistoryError,
    records::{call_history, open_call_db, query_records},
};
use crate::{
    artifacts::ios::{addressbook::lookup::ContactLookup, backup::manifest::BackupIndex},
    utils::sqlite::{column_projection, value_i64},
};
use common::ios::{CallDirection, CallHistory};
use log::warn;

const CALL_HISTORY: [(&str, &str); 1] = [("HomeDomain", "Library/CallHistoryDB/CallHistory.storedata")];

const RECORD_COLUMNS: [&str; 8] = [
    "Z_PK",
    "ZORIGINATED",
    "ZANSWERED",
    "ZDATE",
    "ZDURATION",
    "ZADDRESS",
    "ZNAME",
    "ZSERVICE_PROVIDER",
];

/// Get the call history of the backup
pub fn call_history_records(index: &BackupIndex) -> Result<CallHistory, CallHistoryError> {
    let path = match index.resolve_any(&CALL_HISTORY) {
        Ok(result) => result,
        Err(err) => {
            warn!("[callhistory] CallHistory.storedata not found: {err:?}");
            return Err(CallHistoryError::ArtifactAbsent);
        }
    };
    let (conn, observed) = open_call_db(&path)?;

    let projection = column_projection(&observed, &RECORD_COLUMNS, "");
    let query = format!("SELECT {projection} FROM ZCALLRECORD ORDER BY ZDATE DESC");

    let lookup = ContactLookup::open(index);
    let records = query_records(
        &conn,
        &query,
        |row| match value_i64(row, "ZORIGINATED") {
            Some(0) => CallDirection::In,
            Some(1) => CallDirection::Out,
            _ => CallDirection::Unknown,
        },
        lookup.as_ref(),
    )?;
    Ok(call_history(&conn, records))
}

#[cfg(test)]
mod tests {
    use super::call_history_records;
    use crate::artifacts::ios::{
        addressbook::contacts::tests::addressbook_backup,
        callhistory::records::tests::CALLS_SQL,
    };
    use crate::utils::testing::TestBackup;
    use common::ios::CallDirection;

    #[test]
    fn test_call_history_records() {
        let mut backup = addressbook_backup();
        backup.add_sqlite("HomeDomain", "Library/CallHistoryDB/CallHistory.storedata", CALLS_SQL);
        let index = backup.open();

        let history = call_history_records(&index).unwrap();
        assert_eq!(history.records.len(), 3);
        assert_eq!(history.records[0].direction, CallDirection::Out);
        assert_eq!(history.records[2].direction, CallDirection::In);
        assert_eq!(history.records[2].answered, Some(true));
        assert_eq!(history.records[2].name.as_deref(), Some("민수 김"));
        assert_eq!(history.records[0].service.as_deref(), Some("com.apple.FaceTime"));
    }

    #[test]
    fn test_reduced_schema() {
        let mut backup = TestBackup::new();
        backup.add_sqlite(
            "HomeDomain",
            "Library/CallHistoryDB/CallHistory.storedata",
            "CREATE TABLE ZCALLRECORD (Z_PK INTEGER PRIMARY KEY, ZDATE TIMESTAMP, ZADDRESS VARCHAR);
             INSERT INTO ZCALLRECORD VALUES (3, 700000000, '01099998888');",
        );
        let index = backup.open();
        let history = call_history_records(&index).unwrap();
        assert_eq!(history.records[0].direction, CallDirection::Unknown);
        assert!(history.records[0].answered.is_none());
        assert_eq!(history.deleted_estimate, 2);
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_call_history() {
        let backup = TestBackup::new();
        let index = backup.open();
        call_history_records(&index).unwrap();
    }
}
