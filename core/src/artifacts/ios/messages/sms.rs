/**
 * Parse the SMS/iMessage database `sms.db`
 * Chats are linked to messages through `chat_message_join`. A join row can outlive its message row,
 * in that case the join id is tried as an attachment id
 */
use super::error::MessagesError;
use crate::{
    artifacts::ios::{addressbook::lookup::ContactLookup, backup::manifest::BackupIndex},
    utils::{
        sqlite::{column_projection, has_table, open_sqlite, table_columns, value_f64, value_i64, value_text},
        strings::{contains_insensitive, normalize_nfc},
        time::{convert_date, render_kst_opt},
    },
};
use common::ios::{Chat, ChatRow, Message, MessageDirection};
use log::{error, warn};
use rusqlite::Connection;

pub(crate) const SMS_DB_ID: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";

/// Open `sms.db` by its fixed `fileID`
fn open_sms(index: &BackupIndex) -> Result<Connection, MessagesError> {
    let path = match index.resolve_file_id(SMS_DB_ID) {
        Ok(result) => result,
        Err(err) => {
            warn!("[messages] sms.db not found: {err:?}");
            return Err(MessagesError::ArtifactAbsent);
        }
    };
    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[messages] Failed to open sms.db: {err:?}");
            return Err(MessagesError::SqliteParse);
        }
    };
    for table in ["chat", "message", "chat_message_join"] {
        if !has_table(&conn, table) {
            error!("[messages] sms.db has no {table} table");
            return Err(MessagesError::SchemaDrift);
        }
    }
    Ok(conn)
}

/// List chats with their latest activity, most recent first
pub fn chats(index: &BackupIndex) -> Result<Vec<ChatRow>, MessagesError> {
    let conn = open_sms(index)?;
    let lookup = ContactLookup::open(index);
    chat_rows(&conn, lookup.as_ref())
}

fn chat_rows(
    conn: &Connection,
    lookup: Option<&ContactLookup>,
) -> Result<Vec<ChatRow>, MessagesError> {
    let observed = table_columns(conn, "chat");
    let projection = column_projection(
        &observed,
        &["chat_identifier", "display_name", "last_read_message_timestamp"],
        "c",
    );
    let query = format!(
        "SELECT c.ROWID AS chat_id, {projection}, latest.last_date AS last_date FROM chat c
         LEFT JOIN (SELECT cmj.chat_id AS chat_id, MAX(m.date) AS last_date FROM chat_message_join cmj
         JOIN message m ON m.ROWID = cmj.message_id GROUP BY cmj.chat_id) latest ON latest.chat_id = c.ROWID
         ORDER BY latest.last_date DESC, c.ROWID ASC"
    );

    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[messages] Failed to compose chat query: {err:?}");
            return Err(MessagesError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| {
        let identifier = normalize_nfc(&value_text(row, "chat_identifier"));
        let display = normalize_nfc(&value_text(row, "display_name"));
        let last_activity = value_f64(row, "last_date")
            .or_else(|| value_f64(row, "last_read_message_timestamp"))
            .and_then(convert_date);
        Ok((row.get::<_, i64>("chat_id")?, identifier, display, last_activity))
    });

    let mut results = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                let (chat_id, identifier, display, last_activity) = match row {
                    Ok(result) => result,
                    Err(err) => {
                        warn!("[messages] Skipping chat row: {err:?}");
                        continue;
                    }
                };
                let counterparty = if !display.is_empty() {
                    display
                } else {
                    lookup
                        .and_then(|contacts| contacts.name_for(&identifier))
                        .unwrap_or(identifier)
                };
                results.push(ChatRow {
                    chat_id,
                    counterparty,
                    last_activity,
                });
            }
        }
        Err(err) => {
            error!("[messages] Failed to query chats: {err:?}");
            return Err(MessagesError::BadSQL);
        }
    }
    Ok(results)
}

/// Get the messages of one chat in ascending time order
pub fn chat_messages(index: &BackupIndex, chat_id: i64) -> Result<Vec<Message>, MessagesError> {
    let conn = open_sms(index)?;
    messages_for_chat(&conn, chat_id)
}

fn messages_for_chat(conn: &Connection, chat_id: i64) -> Result<Vec<Message>, MessagesError> {
    let join_columns = table_columns(conn, "chat_message_join");
    let message_columns = table_columns(conn, "message");
    let projection = column_projection(&message_columns, &["text", "date", "is_from_me"], "m");
    let join_date = if join_columns.contains("message_date") {
        "cmj.message_date"
    } else {
        "NULL"
    };
    let message_date = if message_columns.contains("date") {
        "m.date"
    } else {
        "NULL"
    };
    let query = format!(
        "SELECT cmj.message_id AS join_id, m.ROWID AS message_rowid, {projection}, {join_date} AS join_date,
         COALESCE({message_date}, {join_date}) AS sort_date FROM chat_message_join cmj
         LEFT JOIN message m ON m.ROWID = cmj.message_id WHERE cmj.chat_id = ?1
         ORDER BY sort_date ASC, cmj.message_id ASC"
    );

    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[messages] Failed to compose message query: {err:?}");
            return Err(MessagesError::BadSQL);
        }
    };
    let rows = stmt.query_map([chat_id], |row| {
        Ok(JoinRow {
            join_id: row.get("join_id")?,
            message_rowid: value_i64(row, "message_rowid"),
            text: normalize_nfc(&value_text(row, "text")),
            is_from_me: value_i64(row, "is_from_me").unwrap_or_default() != 0,
            date: value_f64(row, "date").or_else(|| value_f64(row, "join_date")),
        })
    });

    let join_rows: Vec<JoinRow> = match rows {
        Ok(row_iter) => row_iter
            .filter_map(|row| match row {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!("[messages] Skipping message row: {err:?}");
                    None
                }
            })
            .collect(),
        Err(err) => {
            error!("[messages] Failed to query messages: {err:?}");
            return Err(MessagesError::BadSQL);
        }
    };

    let mut messages = Vec::new();
    for join in join_rows {
        let datetime = join.date.and_then(convert_date);
        match join.message_rowid {
            Some(id) => {
                let attachment = if join.text.is_empty() {
                    message_attachment(conn, id)
                } else {
                    None
                };
                messages.push(Message {
                    id,
                    direction: if join.is_from_me {
                        MessageDirection::Out
                    } else {
                        MessageDirection::In
                    },
                    body: join.text,
                    attachment,
                    datetime_kst: render_kst_opt(&datetime),
                    datetime,
                });
            }
            None => match attachment_by_rowid(conn, join.join_id) {
                Some(filename) => messages.push(Message {
                    id: join.join_id,
                    direction: MessageDirection::In,
                    body: String::new(),
                    attachment: Some(filename),
                    datetime_kst: render_kst_opt(&datetime),
                    datetime,
                }),
                None => warn!(
                    "[messages] Join row {} has no message or attachment",
                    join.join_id
                ),
            },
        }
    }
    Ok(messages)
}

struct JoinRow {
    join_id: i64,
    message_rowid: Option<i64>,
    text: String,
    is_from_me: bool,
    date: Option<f64>,
}

/// First attachment filename of a message
fn message_attachment(conn: &Connection, message_id: i64) -> Option<String> {
    if !has_table(conn, "message_attachment_join") {
        return None;
    }
    single_filename(
        conn,
        "SELECT a.filename FROM message_attachment_join maj JOIN attachment a ON a.ROWID = maj.attachment_id WHERE maj.message_id = ?1 ORDER BY a.ROWID LIMIT 1",
        message_id,
    )
}

fn attachment_by_rowid(conn: &Connection, rowid: i64) -> Option<String> {
    single_filename(
        conn,
        "SELECT filename FROM attachment WHERE ROWID = ?1",
        rowid,
    )
}

fn single_filename(conn: &Connection, query: &str, id: i64) -> Option<String> {
    if !table_columns(conn, "attachment").contains("filename") {
        return None;
    }
    let result = conn.query_row(query, [id], |row| row.get::<_, Option<String>>(0));
    match result {
        Ok(Some(filename)) => Some(normalize_nfc(&filename)),
        Ok(None) | Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(err) => {
            warn!("[messages] Attachment lookup failed: {err:?}");
            None
        }
    }
}

/**
 * Get every chat with its messages.
 * An optional query keeps chats whose counterparty or any message body contains it
 */
pub fn all_chats(index: &BackupIndex, query: Option<&str>) -> Result<Vec<Chat>, MessagesError> {
    let conn = open_sms(index)?;
    let lookup = ContactLookup::open(index);
    let rows = chat_rows(&conn, lookup.as_ref())?;

    let mut results = Vec::new();
    for chat in rows {
        let messages = match messages_for_chat(&conn, chat.chat_id) {
            Ok(result) => result,
            Err(err) => {
                warn!("[messages] Could not read chat {}: {err:?}", chat.chat_id);
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
    use super::{all_chats, chat_messages, chats, SMS_DB_ID};
    use crate::{
        artifacts::ios::addressbook::contacts::tests::addressbook_backup,
        utils::testing::TestBackup,
    };
    use common::ios::MessageDirection;

    // Dates are nanoseconds since 2001-01-01
    const SMS_SQL: &str = "
        CREATE TABLE chat (ROWID INTEGER PRIMARY KEY AUTOINCREMENT, guid TEXT, chat_identifier TEXT, display_name TEXT, last_read_message_timestamp INTEGER);
        CREATE TABLE message (ROWID INTEGER PRIMARY KEY AUTOINCREMENT, text TEXT, date INTEGER, is_from_me INTEGER);
        CREATE TABLE chat_message_join (chat_id INTEGER, message_id INTEGER, message_date INTEGER, PRIMARY KEY (chat_id, message_id));
        CREATE TABLE attachment (ROWID INTEGER PRIMARY KEY AUTOINCREMENT, filename TEXT, mime_type TEXT);
        CREATE TABLE message_attachment_join (message_id INTEGER, attachment_id INTEGER);
        INSERT INTO chat (ROWID, chat_identifier, display_name, last_read_message_timestamp) VALUES
            (1, '+821012345678', '', 0),
            (2, 'group-chat', 'Team', 0);
        INSERT INTO message (ROWID, text, date, is_from_me) VALUES
            (10, '안녕하세요', 726973200000000000, 0),
            (11, 'hi there', 726973260000000000, 1),
            (12, NULL, 726973320000000000, 0),
            (20, 'meeting at 3', 726900000000000000, 1);
        INSERT INTO attachment (ROWID, filename) VALUES
            (1, '~/Library/SMS/Attachments/aa/photo.heic'),
            (99, '~/Library/SMS/Attachments/bb/voice.caf');
        INSERT INTO message_attachment_join VALUES (12, 1);
        INSERT INTO chat_message_join VALUES
            (1, 11, 726973260000000000),
            (1, 10, 726973200000000000),
            (1, 12, 726973320000000000),
            (1, 99, 726973400000000000),
            (1, 55, 726973500000000000),
            (2, 20, 726900000000000000);
    ";

    fn sms_backup() -> TestBackup {
        let backup = addressbook_backup();
        backup.sqlite_blob(SMS_DB_ID, SMS_SQL);
        backup
    }

    #[test]
    fn test_chats() {
        let backup = sms_backup();
        let index = backup.open();
        let results = chats(&index).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chat_id, 1);
        assert_eq!(results[0].counterparty, "민수 김");
        assert_eq!(results[1].counterparty, "Team");
        assert!(results[0].last_activity > results[1].last_activity);
    }

    #[test]
    fn test_chat_messages_order_and_attachments() {
        let backup = sms_backup();
        let index = backup.open();
        let messages = chat_messages(&index, 1).unwrap();
        assert_eq!(messages.len(), 4);

        assert_eq!(messages[0].body, "안녕하세요");
        assert_eq!(messages[0].direction, MessageDirection::In);
        assert_eq!(messages[0].datetime_kst, "2024-01-15 10:00:00");
        assert_eq!(messages[1].direction, MessageDirection::Out);

        assert_eq!(messages[2].body, "");
        assert_eq!(
            messages[2].attachment.as_deref(),
            Some("~/Library/SMS/Attachments/aa/photo.heic")
        );

        let orphan = &messages[3];
        assert_eq!(orphan.id, 99);
        assert_eq!(orphan.direction, MessageDirection::In);
        assert_eq!(orphan.body, "");
        assert_eq!(
            orphan.attachment.as_deref(),
            Some("~/Library/SMS/Attachments/bb/voice.caf")
        );

        for pair in messages.windows(2) {
            assert!(pair[0].datetime <= pair[1].datetime);
        }
        assert_eq!(messages, chat_messages(&index, 1).unwrap());
    }

    #[test]
    fn test_all_chats_query() {
        let backup = sms_backup();
        let index = backup.open();
        assert_eq!(all_chats(&index, None).unwrap().len(), 2);

        let filtered = all_chats(&index, Some("MEETING")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].chat.chat_id, 2);
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_sms() {
        let backup = TestBackup::new();
        let index = backup.open();
        chats(&index).unwrap();
    }
}
