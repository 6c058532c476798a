use super::{contacts::addressbook_path, contacts::display_name, phone::phone_digits};
use crate::{
    artifacts::ios::backup::{filter::escape_like, manifest::BackupIndex},
    utils::{
        sqlite::{open_sqlite, table_columns, value_text},
        strings::normalize_nfc,
    },
};
use log::warn;
use rusqlite::Connection;

/// Shortest digit run worth probing the full text index with
const MIN_DIGITS: usize = 4;

/**
 * Resolve phone numbers to contact names through the AddressBook full text index.
 * Used to enrich call records and chats that only carry a handle
 */
pub(crate) struct ContactLookup {
    conn: Connection,
    has_fts: bool,
}

impl ContactLookup {
    /// Open the backup AddressBook. `None` if the backup has no AddressBook
    pub(crate) fn open(index: &BackupIndex) -> Option<ContactLookup> {
        let path = addressbook_path(index)?;
        let conn = match open_sqlite(&path) {
            Ok(result) => result,
            Err(err) => {
                warn!("[addressbook] Could not open AddressBook for name lookup: {err:?}");
                return None;
            }
        };
        let has_fts = table_columns(&conn, "ABPersonFullTextSearch_content").contains("c16Phone");
        Some(ContactLookup { conn, has_fts })
    }

    /// Look up a display name for a phone number or handle
    pub(crate) fn name_for(&self, handle: &str) -> Option<String> {
        let digits = phone_digits(handle);
        if digits.len() < MIN_DIGITS {
            return None;
        }
        let pattern = format!("%{}%", escape_like(&digits));

        let query = if self.has_fts {
            "SELECT p.First AS First, p.Last AS Last FROM ABPersonFullTextSearch_content f JOIN ABPerson p ON p.ROWID = f.docid WHERE f.c16Phone LIKE ?1 ESCAPE '\\' LIMIT 1"
        } else {
            // Older databases without the index: compare digits of the stored multi-values
            "SELECT p.First AS First, p.Last AS Last FROM ABMultiValue mv JOIN ABPerson p ON p.ROWID = mv.record_id WHERE REPLACE(REPLACE(REPLACE(REPLACE(mv.value, '-', ''), ' ', ''), '+82', '0'), '+', '') LIKE ?1 ESCAPE '\\' LIMIT 1"
        };

        let result = self.conn.query_row(query, [&pattern], |row| {
            Ok(display_name(
                &normalize_nfc(&value_text(row, "First")),
                &normalize_nfc(&value_text(row, "Last")),
            ))
        });
        match result {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(err) => {
                warn!("[addressbook] Name lookup failed: {err:?}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ContactLookup;
    use crate::{
        artifacts::ios::addressbook::contacts::tests::addressbook_backup,
        utils::testing::TestBackup,
    };

    #[test]
    fn test_name_for() {
        let backup = addressbook_backup();
        let index = backup.open();
        let lookup = ContactLookup::open(&index).unwrap();

        assert_eq!(lookup.name_for("+821012345678").unwrap(), "민수 김");
        assert_eq!(lookup.name_for("010-1234-5678").unwrap(), "민수 김");
        assert_eq!(lookup.name_for("025550100").unwrap(), "Jane Doe");
        assert!(lookup.name_for("99999999").is_none());
        assert!(lookup.name_for("12").is_none());
        assert!(lookup.name_for("mail@example.com").is_none());
    }

    #[test]
    fn test_lookup_without_fts() {
        let mut backup = TestBackup::new();
        backup.add_sqlite(
            "HomeDomain",
            "Library/AddressBook/AddressBook.sqlitedb",
            "CREATE TABLE ABPerson (ROWID INTEGER PRIMARY KEY, First TEXT, Last TEXT);
             CREATE TABLE ABMultiValue (record_id INTEGER, value TEXT);
             INSERT INTO ABPerson VALUES (1, 'Kim', NULL);
             INSERT INTO ABMultiValue VALUES (1, '+82 10-2222-3333');",
        );
        let index = backup.open();
        let lookup = ContactLookup::open(&index).unwrap();
        assert_eq!(lookup.name_for("01022223333").unwrap(), "Kim");
    }

    #[test]
    fn test_no_addressbook() {
        let backup = TestBackup::new();
        let index = backup.open();
        assert!(ContactLookup::open(&index).is_none());
    }
}
