/**
 * Parse LINE chats from `Line.sqlite`
 * The database path contains the account's private store id so it is found by name in the LINE group container,
 * falling back to the well-known blob when the catalog row is missing.
 * `ZSENDER` NULL or 0 marks messages sent by the device owner ("Me"). Chat `Z_PK = 1` is the owner's own chat
 */
use super::error::LineError;
use crate::{
    artifacts::ios::backup::{filter::EntryFilter, manifest::BackupIndex},
    utils::{
        sqlite::{
            column_projection, has_table, open_sqlite, table_columns, value_f64, value_i64,
            value_text,
        },
        strings::{contains_insensitive, normalize_nfc},
        time::{convert_date, render_kst_opt},
    },
};
use common::ios::{Chat, ChatRow, Message, MessageDirection};
use log::{error, warn};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

const LINE_DOMAIN: &str = "AppDomainGroup-group.com.linecorp.line";
const LINE_DB: &str = "Line.sqlite";
/// Well-known blob of `Line.sqlite` as `(fileID prefix, fileID suffix)`
const LINE_BLOB: (&str, &str) = ("ce21064c", "b8c9");
const OWNER_CHAT: i64 = 1;

struct LineDatabase {
    conn: Connection,
    messages: BTreeSet<String>,
    users: BTreeMap<i64, String>,
}

fn open_line(index: &BackupIndex) -> Result<LineDatabase, LineError> {
    let filter = EntryFilter::new()
        .domain(LINE_DOMAIN)
        .path_ends_with(LINE_DB)
        .files_only();
    let entries = match index.entries(&filter) {
        Ok(result) => result,
        Err(err) => {
            error!("[line] Could not search catalog for Line.sqlite: {err:?}");
            return Err(LineError::Catalog);
        }
    };
    let catalog_hit = entries
        .iter()
        .filter(|entry| entry.relative_path == LINE_DB || entry.relative_path.ends_with("/Line.sqlite"))
        .find_map(|entry| index.resolve_file_id(&entry.file_id).ok());
    let path = match catalog_hit {
        Some(result) => result,
        None => match index.find_blob(LINE_BLOB.0, LINE_BLOB.1) {
            Ok(result) => result,
            Err(_) => {
                warn!("[line] Line.sqlite not found");
                return Err(LineError::ArtifactAbsent);
            }
        },
    };
    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[line] Failed to open Line.sqlite: {err:?}");
            return Err(LineError::SqliteParse);
        }
    };

    let messages = table_columns(&conn, "ZMESSAGE");
    if messages.is_empty() || !has_table(&conn, "ZCHAT") {
        error!("[line] Line.sqlite has no ZCHAT or ZMESSAGE table");
        return Err(LineError::SchemaDrift);
    }
    let users = load_users(&conn);
    Ok(LineDatabase {
        conn,
        messages,
        users,
    })
}

fn load_users(conn: &Connection) -> BTreeMap<i64, String> {
    let mut users = BTreeMap::new();
    let observed = table_columns(conn, "ZUSER");
    if observed.is_empty() {
        warn!("[line] Line.sqlite has no ZUSER table");
        return users;
    }
    let projection = column_projection(&observed, &["ZNAME"], "");
    let mut stmt = match conn.prepare(&format!("SELECT Z_PK, {projection} FROM ZUSER")) {
        Ok(result) => result,
        Err(err) => {
            warn!("[line] Failed to compose ZUSER query: {err:?}");
            return users;
        }
    };
    let rows = stmt.query_map([], |row| {
        Ok((value_i64(row, "Z_PK"), normalize_nfc(&value_text(row, "ZNAME"))))
    });
    match rows {
        Ok(row_iter) => {
            for (id, name) in row_iter.flatten() {
                if let Some(pk) = id {
                    users.insert(pk, name);
                }
            }
        }
        Err(err) => warn!("[line] Failed to query ZUSER: {err:?}"),
    }
    users
}

/// List chats, most recently updated first
pub fn line_chats(index: &BackupIndex) -> Result<Vec<ChatRow>, LineError> {
    let database = open_line(index)?;
    chat_rows(&database)
}

fn chat_rows(database: &LineDatabase) -> Result<Vec<ChatRow>, LineError> {
    let chat_columns = table_columns(&database.conn, "ZCHAT");
    let projection = column_projection(&chat_columns, &["ZLASTUPDATED"], "c");
    let sender = if database.messages.contains("ZSENDER") && database.messages.contains("ZCHAT") {
        let order = if database.messages.contains("ZTIMESTAMP") {
            "m.ZTIMESTAMP DESC, m.Z_PK DESC"
        } else {
            "m.Z_PK DESC"
        };
        format!(
            "(SELECT m.ZSENDER FROM ZMESSAGE m WHERE m.ZCHAT = c.Z_PK AND m.ZSENDER IS NOT NULL AND m.ZSENDER != 0 ORDER BY {order} LIMIT 1)"
        )
    } else {
        String::from("NULL")
    };
    let query = format!(
        "SELECT c.Z_PK AS chat_id, {projection}, {sender} AS sender FROM ZCHAT c WHERE c.Z_PK != {OWNER_CHAT}"
    );

    let mut stmt = match database.conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[line] Failed to compose chat query: {err:?}");
            return Err(LineError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| {
        let sender = value_i64(row, "sender");
        let counterparty = match sender {
            Some(pk) => database
                .users
                .get(&pk)
                .filter(|name| !name.is_empty())
                .cloned()
                .unwrap_or_else(|| pk.to_string()),
            None => String::new(),
        };
        Ok(ChatRow {
            chat_id: row.get("chat_id")?,
            counterparty,
            last_activity: value_f64(row, "ZLASTUPDATED").and_then(convert_date),
        })
    });

    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(result) => results.push(result),
                    Err(err) => warn!("[line] Skipping chat row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[line] Failed to query chats: {err:?}");
            return Err(LineError::BadSQL);
        }
    }
    results.sort_by(|first, second| second.last_activity.cmp(&first.last_activity));
    Ok(results)
}

/// Messages of one chat in ascending `ZTIMESTAMP` order
pub fn line_messages(index: &BackupIndex, chat_id: i64) -> Result<Vec<Message>, LineError> {
    let database = open_line(index)?;
    messages_for_chat(&database, chat_id)
}

fn messages_for_chat(database: &LineDatabase, chat_id: i64) -> Result<Vec<Message>, LineError> {
    if !database.messages.contains("ZCHAT") {
        error!("[line] ZMESSAGE has no ZCHAT column");
        return Err(LineError::SchemaDrift);
    }
    let projection = column_projection(&database.messages, &["ZTEXT", "ZSENDER", "ZTIMESTAMP"], "");
    let order = if database.messages.contains("ZTIMESTAMP") {
        "ZTIMESTAMP ASC, Z_PK ASC"
    } else {
        "Z_PK ASC"
    };
    let query = format!("SELECT Z_PK, {projection} FROM ZMESSAGE WHERE ZCHAT = ?1 ORDER BY {order}");
    let mut stmt = match database.conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[line] Failed to compose message query: {err:?}");
            return Err(LineError::BadSQL);
        }
    };
    let rows = stmt.query_map([chat_id], |row| {
        let direction = match value_i64(row, "ZSENDER") {
            None | Some(0) => MessageDirection::Out,
            Some(_) => MessageDirection::In,
        };
        let datetime = value_f64(row, "ZTIMESTAMP").and_then(convert_date);
        Ok(Message {
            id: row.get("Z_PK")?,
            direction,
            body: normalize_nfc(&value_text(row, "ZTEXT")),
            attachment: None,
            datetime_kst: render_kst_opt(&datetime),
            datetime,
        })
    });

    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(result) => results.push(result),
                    Err(err) => warn!("[line] Skipping message row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[line] Failed to query messages: {err:?}");
            return Err(LineError::BadSQL);
        }
    }
    Ok(results)
}

/// Every chat with its messages. The query matches the counterparty or any message body
pub fn line_all_chats(index: &BackupIndex, query: Option<&str>) -> Result<Vec<Chat>, LineError> {
    let database = open_line(index)?;
    let mut results = Vec::new();
    for chat in chat_rows(&database)? {
        let messages = match messages_for_chat(&database, chat.chat_id) {
            Ok(result) => result,
            Err(err) => {
                warn!("[line] Could not read chat {}: {err:?}", chat.chat_id);
                continue;
            }
        };
        if let Some(needle) = query {
            let matched = contains_insensitive(&chat.counterparty, needle)
                || messages
                    .iter()
                    .any(|message| contains_insensitive(&message.body, needle));
            if !matched {
                continue;
            }
        }
        results.push(Chat { chat, messages });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::{line_all_chats, line_chats, line_messages, LINE_DOMAIN};
    use crate::utils::testing::TestBackup;
    use common::ios::MessageDirection;

    const LINE_SQL: &str = "
        CREATE TABLE ZUSER (Z_PK INTEGER PRIMARY KEY, ZNAME VARCHAR);
        CREATE TABLE ZCHAT (Z_PK INTEGER PRIMARY KEY, ZLASTUPDATED TIMESTAMP);
        CREATE TABLE ZMESSAGE (Z_PK INTEGER PRIMARY KEY, ZCHAT INTEGER, ZSENDER INTEGER, ZTEXT VARCHAR, ZTIMESTAMP TIMESTAMP);
        INSERT INTO ZUSER VALUES (1, '나'), (5, '田中'), (6, 'Park');
        INSERT INTO ZCHAT VALUES (1, 726000000), (2, 726973200000), (3, 726900000);
        INSERT INTO ZMESSAGE VALUES
            (10, 2, 5, 'こんにちは', 726973100000),
            (11, 2, NULL, '안녕', 726973150000),
            (12, 2, 0, 'see you', 726973200000),
            (13, 3, 6, 'hi', 726900000),
            (14, 1, 0, 'memo', 726000000);
    ";

    fn line_backup() -> TestBackup {
        let mut backup = TestBackup::new();
        backup.add_sqlite(
            LINE_DOMAIN,
            "Library/Application Support/PrivateStore/P_u1234/Messages/Line.sqlite",
            LINE_SQL,
        );
        backup
    }

    #[test]
    fn test_line_chats() {
        let backup = line_backup();
        let index = backup.open();
        let chats = line_chats(&index).unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].chat_id, 2);
        assert_eq!(chats[0].counterparty, "田中");
        assert_eq!(chats[0].last_activity.unwrap().timestamp(), 1705280400);
        assert_eq!(chats[1].counterparty, "Park");
    }

    #[test]
    fn test_line_messages() {
        let backup = line_backup();
        let index = backup.open();
        let messages = line_messages(&index, 2).unwrap();
        let ids: Vec<i64> = messages.iter().map(|message| message.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(messages[0].direction, MessageDirection::In);
        assert_eq!(messages[1].direction, MessageDirection::Out);
        assert_eq!(messages[2].direction, MessageDirection::Out);
        assert_eq!(messages[2].datetime_kst, "2024-01-15 10:00:00");
    }

    #[test]
    fn test_line_search() {
        let backup = line_backup();
        let index = backup.open();
        let chats = line_all_chats(&index, Some("HI")).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].chat.chat_id, 3);
    }

    #[test]
    fn test_line_blob_without_catalog_row() {
        let backup = TestBackup::new();
        backup.sqlite_blob("ce21064c1111111111111111111111111111b8c9", LINE_SQL);
        let index = backup.open();
        assert_eq!(line_chats(&index).unwrap().len(), 2);
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_line() {
        let backup = TestBackup::new();
        let index = backup.open();
        line_chats(&index).unwrap();
    }
}
