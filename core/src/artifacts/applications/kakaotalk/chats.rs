/**
 * Parse KakaoTalk chats from `Message.sqlite` with user names from the sibling `Talk.sqlite`
 * The logged in user is the `ZUSER` row with `ZFRIENDTYPE = 1`.
 * `sentAt` is stored as seconds since 2001 but read as unixepoch, so 978307200 is added
 */
use super::error::KakaoTalkError;
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, open_sqlite, table_columns, value_i64, value_text},
        strings::{contains_insensitive, normalize_nfc},
        time::{render_kst_opt, unixepoch_to_datetime, APPLE_EPOCH_OFFSET},
    },
};
use chrono::{DateTime, Utc};
use common::ios::{Chat, ChatRow, FileEntry, Message, MessageDirection};
use log::{error, warn};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

const KAKAO_APP: &str = "KakaoTalk";
const MESSAGE_DB: &str = "Message.sqlite";
const TALK_DB: &str = "Talk.sqlite";

const MESSAGE_COLUMNS: [&str; 6] = ["id", "chatId", "userId", "message", "sentAt", "attachment"];

/// Users of `Talk.sqlite`: the logged in id and a name per user id
#[derive(Debug, Default)]
struct Users {
    me: Option<i64>,
    names: BTreeMap<i64, String>,
}

struct KakaoDatabase {
    conn: Connection,
    observed: BTreeSet<String>,
    users: Users,
}

/// Convert `sentAt` to an instant
pub(crate) fn sent_at(value: i64) -> Option<DateTime<Utc>> {
    unixepoch_to_datetime(value.checked_add(APPLE_EPOCH_OFFSET)?)
}

fn catalog_entry(index: &BackupIndex, name: &str, domain: Option<&str>) -> Result<Option<FileEntry>, KakaoTalkError> {
    let entries = match index.find_by_keyword(name, None) {
        Ok(result) => result,
        Err(err) => {
            error!("[kakaotalk] Could not search catalog for {name}: {err:?}");
            return Err(KakaoTalkError::Catalog);
        }
    };
    Ok(entries.into_iter().find(|entry| {
        entry.flags == 1
            && contains_insensitive(&entry.domain, KAKAO_APP)
            && domain.map_or(true, |value| entry.domain == value)
            && (entry.relative_path == name || entry.relative_path.ends_with(&format!("/{name}")))
    }))
}

fn open_kakao(index: &BackupIndex) -> Result<KakaoDatabase, KakaoTalkError> {
    let message_entry = match catalog_entry(index, MESSAGE_DB, None)? {
        Some(result) => result,
        None => {
            warn!("[kakaotalk] Message.sqlite not found");
            return Err(KakaoTalkError::ArtifactAbsent);
        }
    };
    let path = match index.resolve_file_id(&message_entry.file_id) {
        Ok(result) => result,
        Err(err) => {
            warn!("[kakaotalk] Message.sqlite blob missing: {err:?}");
            return Err(KakaoTalkError::ArtifactAbsent);
        }
    };
    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[kakaotalk] Failed to open Message.sqlite: {err:?}");
            return Err(KakaoTalkError::SqliteParse);
        }
    };
    let observed = table_columns(&conn, "Message");
    if !observed.contains("chatId") {
        error!("[kakaotalk] Message table or chatId column missing");
        return Err(KakaoTalkError::SchemaDrift);
    }

    let users = match catalog_entry(index, TALK_DB, Some(&message_entry.domain))? {
        Some(entry) => load_users(index, &entry),
        None => {
            warn!("[kakaotalk] Talk.sqlite not found, message direction is unknown");
            Users::default()
        }
    };
    Ok(KakaoDatabase {
        conn,
        observed,
        users,
    })
}

fn load_users(index: &BackupIndex, entry: &FileEntry) -> Users {
    let mut users = Users::default();
    let conn = match index
        .resolve_file_id(&entry.file_id)
        .ok()
        .and_then(|path| open_sqlite(&path).ok())
    {
        Some(result) => result,
        None => {
            warn!("[kakaotalk] Could not open Talk.sqlite");
            return users;
        }
    };
    let observed = table_columns(&conn, "ZUSER");
    if !observed.contains("ZID") {
        warn!("[kakaotalk] Talk.sqlite has no ZUSER.ZID column");
        return users;
    }
    let projection = column_projection(&observed, &["ZID", "ZNAME", "ZNICKNAME", "ZFRIENDTYPE"], "");
    let query = format!("SELECT {projection} FROM ZUSER");
    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            warn!("[kakaotalk] Failed to compose ZUSER query: {err:?}");
            return users;
        }
    };
    let rows = stmt.query_map([], |row| {
        let mut name = normalize_nfc(&value_text(row, "ZNAME"));
        if name.is_empty() {
            name = normalize_nfc(&value_text(row, "ZNICKNAME"));
        }
        Ok((value_i64(row, "ZID"), name, value_i64(row, "ZFRIENDTYPE")))
    });
    match rows {
        Ok(row_iter) => {
            for (id, name, friend_type) in row_iter.flatten() {
                let id = match id {
                    Some(result) => result,
                    None => continue,
                };
                if friend_type == Some(1) {
                    users.me = Some(id);
                }
                if !name.is_empty() {
                    users.names.insert(id, name);
                }
            }
        }
        Err(err) => warn!("[kakaotalk] Failed to query ZUSER: {err:?}"),
    }
    users
}

/// List chats, most recent activity first
pub fn kakaotalk_chats(index: &BackupIndex) -> Result<Vec<ChatRow>, KakaoTalkError> {
    let database = open_kakao(index)?;
    chat_rows(&database)
}

fn chat_rows(database: &KakaoDatabase) -> Result<Vec<ChatRow>, KakaoTalkError> {
    let user = if database.observed.contains("userId") {
        "userId"
    } else {
        "NULL"
    };
    let sent = if database.observed.contains("sentAt") {
        "sentAt"
    } else {
        "NULL"
    };
    let query = format!(
        "SELECT DISTINCT chatId AS chat_id, {user} AS user_id, (SELECT MAX({sent}) FROM Message latest WHERE latest.chatId = Message.chatId) AS last_sent FROM Message WHERE chatId IS NOT NULL"
    );
    let mut stmt = match database.conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[kakaotalk] Failed to compose chat query: {err:?}");
            return Err(KakaoTalkError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| {
        Ok((
            value_i64(row, "chat_id"),
            value_i64(row, "user_id"),
            value_i64(row, "last_sent"),
        ))
    });

    // chat id -> (member ids, latest sentAt)
    let mut chats: BTreeMap<i64, (BTreeSet<i64>, Option<i64>)> = BTreeMap::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                let (chat_id, user_id, last_sent) = match row {
                    Ok((Some(chat_id), user_id, last_sent)) => (chat_id, user_id, last_sent),
                    Ok(_) => continue,
                    Err(err) => {
                        warn!("[kakaotalk] Skipping chat row: {err:?}");
                        continue;
                    }
                };
                let entry = chats.entry(chat_id).or_default();
                entry.1 = last_sent;
                if let Some(id) = user_id {
                    if Some(id) != database.users.me {
                        entry.0.insert(id);
                    }
                }
            }
        }
        Err(err) => {
            error!("[kakaotalk] Failed to query chats: {err:?}");
            return Err(KakaoTalkError::BadSQL);
        }
    }

    let mut results: Vec<ChatRow> = chats
        .into_iter()
        .map(|(chat_id, (members, last_sent))| {
            let names: Vec<String> = members
                .iter()
                .map(|id| {
                    database
                        .users
                        .names
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();
            ChatRow {
                chat_id,
                counterparty: names.join(", "),
                last_activity: last_sent.and_then(sent_at),
            }
        })
        .collect();
    results.sort_by(|first, second| second.last_activity.cmp(&first.last_activity));
    Ok(results)
}

/// Messages of one chat ordered by `sentAt`
pub fn kakaotalk_messages(index: &BackupIndex, chat_id: i64) -> Result<Vec<Message>, KakaoTalkError> {
    let database = open_kakao(index)?;
    messages_for_chat(&database, chat_id)
}

fn messages_for_chat(database: &KakaoDatabase, chat_id: i64) -> Result<Vec<Message>, KakaoTalkError> {
    let projection = column_projection(&database.observed, &MESSAGE_COLUMNS, "");
    let order = if database.observed.contains("sentAt") {
        "sentAt ASC, ROWID ASC"
    } else {
        "ROWID ASC"
    };
    let query = format!("SELECT ROWID AS message_rowid, {projection} FROM Message WHERE chatId = ?1 ORDER BY {order}");
    let mut stmt = match database.conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[kakaotalk] Failed to compose message query: {err:?}");
            return Err(KakaoTalkError::BadSQL);
        }
    };
    let me = database.users.me;
    let rows = stmt.query_map([chat_id], |row| {
        let id = value_i64(row, "id")
            .or_else(|| value_i64(row, "message_rowid"))
            .unwrap_or_default();
        let direction = match (value_i64(row, "userId"), me) {
            (Some(user), Some(my_id)) if user == my_id => MessageDirection::Out,
            _ => MessageDirection::In,
        };
        let attachment = normalize_nfc(&value_text(row, "attachment"));
        let datetime = value_i64(row, "sentAt").and_then(sent_at);
        Ok(Message {
            id,
            direction,
            body: normalize_nfc(&value_text(row, "message")),
            attachment: if attachment.is_empty() {
                None
            } else {
                Some(attachment)
            },
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
                    Err(err) => warn!("[kakaotalk] Skipping message row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[kakaotalk] Failed to query messages: {err:?}");
            return Err(KakaoTalkError::BadSQL);
        }
    }
    Ok(results)
}

/// Every chat with its messages. The query matches the counterparty or any message body
pub fn kakaotalk_all_chats(index: &BackupIndex, query: Option<&str>) -> Result<Vec<Chat>, KakaoTalkError> {
    let database = open_kakao(index)?;
    let mut results = Vec::new();
    for chat in chat_rows(&database)? {
        let messages = match messages_for_chat(&database, chat.chat_id) {
            Ok(result) => result,
            Err(err) => {
                warn!("[kakaotalk] Could not read chat {}: {err:?}", chat.chat_id);
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
    use super::{kakaotalk_all_chats, kakaotalk_chats, kakaotalk_messages, sent_at};
    use crate::utils::testing::TestBackup;
    use common::ios::MessageDirection;

    const DOMAIN: &str = "AppDomainGroup-group.com.iwilab.KakaoTalk";

    const MESSAGE_SQL: &str = "
        CREATE TABLE Message (id INTEGER PRIMARY KEY, chatId INTEGER, userId INTEGER, message TEXT, sentAt INTEGER, attachment TEXT);
        INSERT INTO Message VALUES
            (1, 100, 7, '안녕하세요', 726973200, NULL),
            (2, 100, 42, '네 반갑습니다', 726973260, NULL),
            (3, 100, 7, '사진 보내요', 726973230, 'photo.jpg'),
            (4, 200, 9, 'meeting at 3', 726900000, NULL);
    ";

    const TALK_SQL: &str = "
        CREATE TABLE ZUSER (Z_PK INTEGER PRIMARY KEY, ZID INTEGER, ZNAME VARCHAR, ZFRIENDTYPE INTEGER);
        INSERT INTO ZUSER VALUES (1, 42, 'Me', 1), (2, 7, '김철수', 0), (3, 9, 'Lee', 0);
    ";

    fn kakao_backup() -> TestBackup {
        let mut backup = TestBackup::new();
        backup.add_sqlite(DOMAIN, "Library/PrivateDocuments/Message.sqlite", MESSAGE_SQL);
        backup.add_sqlite(DOMAIN, "Library/PrivateDocuments/Talk.sqlite", TALK_SQL);
        backup
    }

    #[test]
    fn test_sent_at() {
        assert_eq!(sent_at(726973200).unwrap().timestamp(), 1705280400);
    }

    #[test]
    fn test_kakaotalk_chats() {
        let backup = kakao_backup();
        let index = backup.open();
        let chats = kakaotalk_chats(&index).unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].chat_id, 100);
        assert_eq!(chats[0].counterparty, "김철수");
        assert_eq!(chats[0].last_activity.unwrap().timestamp(), 1705280460);
        assert_eq!(chats[1].counterparty, "Lee");
    }

    #[test]
    fn test_kakaotalk_messages() {
        let backup = kakao_backup();
        let index = backup.open();
        let messages = kakaotalk_messages(&index, 100).unwrap();
        let ids: Vec<i64> = messages.iter().map(|message| message.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(messages[0].direction, MessageDirection::In);
        assert_eq!(messages[2].direction, MessageDirection::Out);
        assert_eq!(messages[1].attachment.as_deref(), Some("photo.jpg"));
        assert_eq!(messages[0].datetime_kst, "2024-01-15 10:00:00");
    }

    #[test]
    fn test_kakaotalk_search() {
        let backup = kakao_backup();
        let index = backup.open();
        assert_eq!(kakaotalk_all_chats(&index, Some("meeting")).unwrap().len(), 1);
        assert_eq!(kakaotalk_all_chats(&index, None).unwrap().len(), 2);
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_kakaotalk() {
        let backup = TestBackup::new();
        let index = backup.open();
        kakaotalk_chats(&index).unwrap();
    }
}
