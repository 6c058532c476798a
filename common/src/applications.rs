use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SafariHistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String, // Can be null
    pub visit_count: i64,
    pub visit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SafariBookmark {
    pub folder_path: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SafariThumbnail {
    pub relative_path: String,
    pub file_id: String,
    /**Full path to the blob in the backup */
    pub path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionRecord {
    pub url: String,
    pub title: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChromeSession {
    pub relative_path: String,
    pub file_id: String,
    /**Discovery order */
    pub records: Vec<SessionRecord>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct InstagramAccount {
    pub user_id: String,
    pub username: String,
    pub profile_picture_url: String,
    pub last_session_background_time: Option<DateTime<Utc>>,
    /**Any `last_session_*` value rendered as a string */
    pub session: BTreeMap<String, String>,
    pub related_accounts: Vec<String>,
    pub auth_tokens: Vec<InstagramAuthToken>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InstagramAuthToken {
    pub key: String,
    pub account_id: String,
    /**Token belongs to the logged in account */
    pub current: bool,
    pub value: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InstagramDirectMessage {
    pub message_id: String,
    pub thread_id: String,
    pub user_id: String,
    pub body: String,
    pub sent: Option<DateTime<Utc>>,
    pub sent_kst: String,
    /**Relative path of the `DirectSQLiteDatabase` file */
    pub source: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct InstagramFollowing {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub profile_url: String,
    pub followed_by: Option<bool>,
}
