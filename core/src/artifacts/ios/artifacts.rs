use super::{backup::manifest::BackupIndex, calendar::error::CalendarError};
use crate::{
    artifacts::{error::CollectionError, output::output_data},
    structs::toml::{CalendarOptions, Output},
    utils::time,
};
use chrono::{DateTime, Utc};
use log::error;

/// Summarize the device that made the backup
pub(crate) fn device_info(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::device::device_info;

    let start_time = time::time_now();
    let results = device_info(index);
    output_data(results, "device_info", output, index.metadata(), start_time)
}

/// Build the logical file tree of the whole backup
pub(crate) fn backup_files(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::backup::{filter::EntryFilter, tree::BackupTree};

    let start_time = time::time_now();
    let results = BackupTree::build(index, &EntryFilter::new()).map(|tree| tree.display());
    output_data(results, "backup_files", output, index.metadata(), start_time)
}

/// Parse the AddressBook. A query keeps contacts matching a name, number or email
pub(crate) fn contacts(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::addressbook::contacts::{load_contacts, search_contacts};

    let start_time = time::time_now();
    let results = load_contacts(index).map(|contacts| match query {
        Some(needle) => search_contacts(&contacts, needle).into_iter().cloned().collect(),
        None => contacts,
    });
    output_data(results, "contacts", output, index.metadata(), start_time)
}

/// Parse calendar events inside the optional RFC3339 window
pub(crate) fn calendar(
    index: &BackupIndex,
    output: &Output,
    options: Option<&CalendarOptions>,
) -> Result<(), CollectionError> {
    use super::calendar::events::events;

    let start_time = time::time_now();
    let window = match options {
        Some(calendar) => parse_bound(&calendar.start)
            .and_then(|start| parse_bound(&calendar.end).map(|end| (start, end))),
        None => Ok((None, None)),
    };
    let results =
        window.and_then(|(start, end)| events(index, start.as_ref(), end.as_ref()));
    output_data(results, "calendar", output, index.metadata(), start_time)
}

fn parse_bound(value: &Option<String>) -> Result<Option<DateTime<Utc>>, CalendarError> {
    let text = match value {
        Some(result) => result,
        None => return Ok(None),
    };
    match DateTime::parse_from_rfc3339(text) {
        Ok(result) => Ok(Some(result.with_timezone(&Utc))),
        Err(err) => {
            error!("[calendar] Calendar window {text} is not RFC3339: {err:?}");
            Err(CalendarError::BadWindow)
        }
    }
}

/// Parse the CallHistory.storedata call log
pub(crate) fn call_history(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::callhistory::storedata::call_history_records;

    let start_time = time::time_now();
    let results = call_history_records(index);
    output_data(results, "call_history", output, index.metadata(), start_time)
}

/// Parse the older fixed path call history database
pub(crate) fn call_recents(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::callhistory::recents::call_recents;

    let start_time = time::time_now();
    let results = call_recents(index);
    output_data(results, "call_recents", output, index.metadata(), start_time)
}

/// Parse SMS and iMessage chats
pub(crate) fn sms(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::messages::sms::all_chats;

    let start_time = time::time_now();
    let results = all_chats(index, query);
    output_data(results, "sms", output, index.metadata(), start_time)
}

/// Parse Notes with their decoded bodies
pub(crate) fn notes(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::notes::notes::search_notes;

    let start_time = time::time_now();
    let results = search_notes(index, query);
    output_data(results, "notes", output, index.metadata(), start_time)
}

/// Parse known Wi-Fi networks
pub(crate) fn wifi(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::wifi::wifi_networks;

    let start_time = time::time_now();
    let results = wifi_networks(index);
    output_data(results, "wifi", output, index.metadata(), start_time)
}

/// Parse paired Bluetooth devices
pub(crate) fn bluetooth(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::bluetooth::bluetooth_devices;

    let start_time = time::time_now();
    let results = bluetooth_devices(index);
    output_data(results, "bluetooth", output, index.metadata(), start_time)
}

/// Parse configured accounts
pub(crate) fn accounts(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::accounts::accounts;

    let start_time = time::time_now();
    let results = accounts(index);
    output_data(results, "accounts", output, index.metadata(), start_time)
}

/// Parse SIM subscriber numbers
pub(crate) fn subscriber(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::subscriber::subscribers;

    let start_time = time::time_now();
    let results = subscribers(index);
    output_data(results, "subscriber", output, index.metadata(), start_time)
}

/// List installed applications
pub(crate) fn installed_apps(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::system::apps::installed_apps;

    let start_time = time::time_now();
    let results = installed_apps(index);
    output_data(results, "installed_apps", output, index.metadata(), start_time)
}
