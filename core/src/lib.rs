//! Offline analyzer for unencrypted iTunes/Finder iOS backups.
//!
//! Open a backup with [`BackupIndex::open`] and call the decoders directly, or describe a
//! collection in TOML and run it with [`core::parse_toml_file`] / [`core::parse_toml_data`].

mod artifacts;
pub mod core;
pub mod error;
mod filesystem;
mod output;
pub mod structs;
mod utils;

pub use artifacts::applications::{
    chromium::{
        error::ChromiumError,
        sessions::chrome_sessions,
        snss::{parse_snss, scavenge},
    },
    instagram::{
        account::instagram_account, direct::instagram_direct, error::InstagramError,
        following::instagram_following,
    },
    kakaotalk::{
        chats::{kakaotalk_all_chats, kakaotalk_chats, kakaotalk_messages},
        error::KakaoTalkError,
    },
    line::{
        error::LineError,
        talk::{line_all_chats, line_chats, line_messages},
    },
    safari::{
        bookmarks::safari_bookmarks, error::SafariError, history::safari_history,
        thumbnails::safari_thumbnails,
    },
};
pub use artifacts::ios::{
    addressbook::{
        contacts::{emails, get_phone_number, load_contacts, phone_numbers, search_contacts},
        error::AddressBookError,
        phone::format_phone,
    },
    backup::{
        error::BackupError,
        filter::EntryFilter,
        manifest::{file_id, BackupIndex},
        tree::{categorize_domain, BackupTree},
    },
    calendar::{
        error::CalendarError,
        events::{calendars, events, month_events},
    },
    callhistory::{
        error::CallHistoryError, recents::call_recents, storedata::call_history_records,
    },
    messages::{
        error::MessagesError,
        sms::{all_chats, chat_messages, chats},
    },
    notes::{
        error::NotesError,
        notes::{note_detail, note_details, note_summaries, search_notes},
    },
    plist::error::PlistError,
    system::{
        accounts::accounts, apps::installed_apps, bluetooth::bluetooth_devices,
        device::device_info, error::SystemError, subscriber::subscribers, wifi::wifi_networks,
    },
};
pub use utils::{
    strings::normalize_nfc,
    time::{
        apple_float_seconds, apple_microseconds, apple_milliseconds, apple_seconds,
        apply_session_offset, chrome_microseconds, convert_date, format_mac_time,
        in_session_window, normalize_session_time, render_kst, render_kst_opt, to_mac_seconds,
        unix_microseconds, unix_milliseconds, unix_seconds, unixepoch_to_datetime,
        APPLE_EPOCH_OFFSET, WINDOWS_EPOCH_OFFSET,
    },
};
