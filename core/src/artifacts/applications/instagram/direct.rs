/**
 * Parse Instagram direct messages from the `DirectSQLiteDatabase` stores
 * Each `messages.archive` value is an NSKeyedArchiver blob. The message layout is positional:
 *   `$objects[5]`, `[7]` and `[8]` are the message, thread and sender ids
 *   `$objects[11]`, `[12]` and `[14]` hold the text fragments when they are strings
 *   the first dictionary with `NS.time` is the sent time (Apple Absolute seconds)
 */
use super::error::InstagramError;
use crate::{
    artifacts::ios::{
        backup::manifest::BackupIndex,
        plist::archiver::{ArchiveObject, KeyedArchive},
    },
    utils::{
        sqlite::{open_sqlite, table_columns, value_bytes},
        strings::{contains_insensitive, normalize_nfc},
        time::{apple_float_seconds, render_kst_opt},
    },
};
use chrono::{DateTime, Utc};
use common::{applications::InstagramDirectMessage, ios::FileEntry};
use log::{error, warn};

const DIRECT_KEYWORD: &str = "DirectSQLiteDatabase";
const INSTAGRAM_APP: &str = "instagram";
const ID_SLOTS: [usize; 3] = [5, 7, 8];
const TEXT_SLOTS: [usize; 3] = [11, 12, 14];
const FRAGMENT_SEPARATOR: &str = " / ";

/// Metadata files next to a SQLITE database
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

fn direct_databases(index: &BackupIndex) -> Result<Vec<FileEntry>, InstagramError> {
    let entries = match index.find_by_keyword(DIRECT_KEYWORD, None) {
        Ok(result) => result,
        Err(err) => {
            error!("[instagram] Could not search catalog for direct databases: {err:?}");
            return Err(InstagramError::Catalog);
        }
    };
    Ok(entries
        .into_iter()
        .filter(|entry| {
            entry.flags == 1
                && contains_insensitive(&entry.domain, INSTAGRAM_APP)
                && !SIDECAR_SUFFIXES
                    .iter()
                    .any(|suffix| entry.relative_path.ends_with(suffix))
        })
        .collect())
}

/// Get direct messages from every `DirectSQLiteDatabase` in the backup
pub fn instagram_direct(index: &BackupIndex) -> Result<Vec<InstagramDirectMessage>, InstagramError> {
    let databases = direct_databases(index)?;
    if databases.is_empty() {
        warn!("[instagram] No DirectSQLiteDatabase files in backup");
        return Err(InstagramError::ArtifactAbsent);
    }

    let mut messages = Vec::new();
    for entry in databases {
        let path = match index.resolve_file_id(&entry.file_id) {
            Ok(result) => result,
            Err(err) => {
                warn!("[instagram] Direct database blob missing {}: {err:?}", entry.relative_path);
                continue;
            }
        };
        let conn = match open_sqlite(&path) {
            Ok(result) => result,
            Err(err) => {
                warn!("[instagram] Could not open {}: {err:?}", entry.relative_path);
                continue;
            }
        };
        if !table_columns(&conn, "messages").contains("archive") {
            warn!("[instagram] {} has no messages.archive column", entry.relative_path);
            continue;
        }

        let mut stmt = match conn.prepare("SELECT archive FROM messages WHERE archive IS NOT NULL") {
            Ok(result) => result,
            Err(err) => {
                warn!("[instagram] Failed to compose messages query: {err:?}");
                continue;
            }
        };
        let blobs: Vec<Vec<u8>> = match stmt.query_map([], |row| Ok(value_bytes(row, "archive"))) {
            Ok(rows) => rows.flatten().flatten().collect(),
            Err(err) => {
                warn!("[instagram] Failed to query messages: {err:?}");
                continue;
            }
        };

        for blob in blobs {
            let archive = match KeyedArchive::parse(&blob) {
                Ok(result) => result,
                Err(err) => {
                    warn!("[instagram] Skipping message archive: {err:?}");
                    continue;
                }
            };
            messages.push(archive_message(&archive, &entry.relative_path));
        }
    }
    Ok(messages)
}

/// Extract one direct message from its keyed archive
pub(crate) fn archive_message(archive: &KeyedArchive, source: &str) -> InstagramDirectMessage {
    let slot_text = |slot: usize| -> String {
        match archive.object(slot) {
            Ok(object) => archive
                .string(object)
                .or_else(|| object.render())
                .map(|text| normalize_nfc(&text))
                .unwrap_or_default(),
            Err(_) => String::new(),
        }
    };
    let fragments: Vec<String> = TEXT_SLOTS
        .iter()
        .filter_map(|slot| match archive.object(*slot) {
            Ok(ArchiveObject::String(text)) if !text.is_empty() => Some(normalize_nfc(text)),
            _ => None,
        })
        .collect();

    let sent = sent_time(archive);
    InstagramDirectMessage {
        message_id: slot_text(ID_SLOTS[0]),
        thread_id: slot_text(ID_SLOTS[1]),
        user_id: slot_text(ID_SLOTS[2]),
        body: fragments.join(FRAGMENT_SEPARATOR),
        sent_kst: render_kst_opt(&sent),
        sent,
        source: source.to_string(),
    }
}

fn sent_time(archive: &KeyedArchive) -> Option<DateTime<Utc>> {
    archive
        .objects()
        .iter()
        .filter(|object| object.is_dict())
        .find_map(|object| archive.dict_get(object, "NS.time"))
        .and_then(ArchiveObject::as_f64)
        .and_then(apple_float_seconds)
}

#[cfg(test)]
mod tests {
    use super::{archive_message, instagram_direct};
    use crate::{
        artifacts::ios::plist::archiver::{
            tests::{build_archive, dict, uid},
            KeyedArchive,
        },
        utils::testing::TestBackup,
    };
    use plist::Value;
    use rusqlite::Connection;

    fn message_objects() -> Vec<Value> {
        let text = |value: &str| Value::String(value.to_string());
        vec![
            text("$null"),
            dict(vec![("$class", uid(2)), ("date", uid(3))]),
            dict(vec![("$classname", text("IGDirectMessage"))]),
            dict(vec![("NS.time", Value::Real(726973200.0))]),
            text("unused"),
            text("msg-1"),
            text("unused"),
            text("thread-9"),
            Value::Integer(1111.into()),
            text("unused"),
            text("unused"),
            // decomposed 한글
            text("\u{1112}\u{1161}\u{11ab}\u{1100}\u{1173}\u{11af}"),
            text("see you"),
            Value::Integer(3.into()),
            text("tomorrow"),
        ]
    }

    #[test]
    fn test_archive_message() {
        let archive = KeyedArchive::parse(&build_archive(message_objects(), 1)).unwrap();
        let message = archive_message(&archive, "DirectSQLiteDatabase/1111.db");
        assert_eq!(message.message_id, "msg-1");
        assert_eq!(message.thread_id, "thread-9");
        assert_eq!(message.user_id, "1111");
        assert_eq!(message.body, "한글 / see you / tomorrow");
        assert_eq!(message.sent.unwrap().timestamp(), 1705280400);
        assert_eq!(message.sent_kst, "2024-01-15 10:00:00");
    }

    #[test]
    fn test_instagram_direct() {
        let mut backup = TestBackup::new();
        let path = backup.add_sqlite(
            "AppDomainGroup-group.com.burbn.instagram",
            "DirectSQLiteDatabase/1111.db",
            "CREATE TABLE messages (message_id TEXT, archive BLOB);",
        );
        backup.add_file(
            "AppDomainGroup-group.com.burbn.instagram",
            "DirectSQLiteDatabase/1111.db-wal",
            b"",
        );
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO messages VALUES ('msg-1', ?1)",
            [build_archive(message_objects(), 1)],
        )
        .unwrap();
        conn.execute("INSERT INTO messages VALUES ('broken', x'00010203')", [])
            .unwrap();
        drop(conn);
        let index = backup.open();

        let messages = instagram_direct(&index).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].source, "DirectSQLiteDatabase/1111.db");
        assert_eq!(messages[0].body, "한글 / see you / tomorrow");
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_no_direct_databases() {
        let backup = TestBackup::new();
        let index = backup.open();
        instagram_direct(&index).unwrap();
    }
}
