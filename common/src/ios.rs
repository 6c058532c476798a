use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FileEntry {
    /**40 hex character SHA1 of `domain-relativePath` */
    pub file_id: String,
    pub domain: String,
    pub relative_path: String,
    /**1 = file, 2 = directory, 4 = symlink */
    pub flags: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomainCategory {
    System,
    UserApp,
    AppGroup,
    AppPlugin,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TreeEntry {
    pub name: String,
    pub full_path: String,
    /**Only set when the node is a file in the backup */
    pub file_id: Option<String>,
    pub children: Vec<TreeEntry>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DomainTree {
    pub category: DomainCategory,
    pub domain: String,
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct BackupMetadata {
    pub is_encrypted: bool,
    pub version: String,
    pub date: Option<DateTime<Utc>>,
    pub system_domains_version: String,
    pub was_passcode_set: bool,
    pub device_name: String,
    pub product_type: String,
    pub product_version: String,
    pub build_version: String,
    pub serial_number: String,
    pub unique_device_id: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct Contact {
    /**ROWID in `ABPerson`. Stable for the source database */
    pub rowid: i64,
    pub first: String,
    pub last: String,
    pub organization: String,
    pub note: String,
    pub guid: String,
    pub creation: Option<DateTime<Utc>>,
    pub modification: Option<DateTime<Utc>>,
    /**Any other `ABPerson` column found in the database */
    pub extra: BTreeMap<String, String>,
    pub values_by_label: BTreeMap<String, Vec<String>>,
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Calendar {
    pub rowid: i64,
    pub title: String,
    pub color: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct CalendarEvent {
    pub event_id: i64,
    pub summary: String,
    pub description: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /**Start rendered in KST */
    pub start_local: String,
    /**End rendered in KST */
    pub end_local: String,
    pub all_day: bool,
    pub calendar_title: String,
    pub color: String,
    pub location_id: Option<i64>,
    pub location: Option<CalendarLocation>,
    pub participants: Vec<Participant>,
    pub alarms: Vec<Alarm>,
    pub attachments: Vec<CalendarAttachment>,
    pub exceptions: Vec<ExceptionDate>,
    pub recurrences: Vec<Recurrence>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Alarm {
    pub rowid: i64,
    pub trigger_date: Option<DateTime<Utc>>,
    /**Seconds relative to the event start */
    pub trigger_interval: i64,
    pub fire_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Participant {
    pub rowid: i64,
    pub email: String,
    pub role: i64,
    pub status: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExceptionDate {
    pub rowid: i64,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Recurrence {
    pub rowid: i64,
    pub frequency: i64,
    pub interval: i64,
    pub count: i64,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CalendarAttachment {
    pub rowid: i64,
    pub filename: String,
    pub file_size: i64,
    pub url: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CalendarLocation {
    pub rowid: i64,
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    In,
    Out,
    Unknown,
}

#[derive(Debug, Serialize, Clone)]
pub struct CallRecord {
    pub pk: i64,
    pub direction: CallDirection,
    pub answered: Option<bool>,
    pub date: Option<DateTime<Utc>>,
    /**Duration in seconds */
    pub duration: f64,
    pub address: String,
    pub name: Option<String>,
    pub service: Option<String>,
    /**Decoded display handle when `ZADDRESS` is wrapped */
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CallHistory {
    pub records: Vec<CallRecord>,
    /**`max(Z_PK) - count(*)` */
    pub deleted_estimate: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    In,
    Out,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub direction: MessageDirection,
    pub body: String,
    pub attachment: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub datetime_kst: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRow {
    pub chat_id: i64,
    pub counterparty: String,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Chat {
    pub chat: ChatRow,
    /**Ascending by source timestamp */
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NoteSummary {
    pub uuid: String,
    pub title: String,
    pub snippet: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub created_kst: String,
    pub modified_kst: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub summary: NoteSummary,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WifiNetwork {
    pub ssid: String,
    pub mac: String,
    pub last_joined: Option<DateTime<Utc>>,
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BluetoothDevice {
    pub uuid: String,
    pub name: String,
    pub address: String,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Account {
    pub username: String,
    pub owning_bundle_id: String,
    pub description: String,
    pub identifier: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Subscriber {
    pub mdn: String,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InstalledApp {
    pub bundle_id: String,
    pub name: String,
    pub version: String,
    /**`iTunesMetadata` or `Info.plist` */
    pub source: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct DeviceInfo {
    /**Whitelisted keys from the backup root `Info.plist` */
    pub properties: BTreeMap<String, String>,
    pub number_of_files: u64,
    /**Sum of regular file sizes under the backup root in bytes */
    pub size_of_image: u64,
}
