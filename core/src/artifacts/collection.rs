use super::{
    applications::artifacts::{
        chrome_sessions, instagram_account, instagram_direct, instagram_following, kakaotalk,
        line, safari_bookmarks, safari_history, safari_thumbnails,
    },
    error::CollectionError,
    ios::{
        artifacts::{
            accounts, backup_files, bluetooth, calendar, call_history, call_recents, contacts,
            device_info, installed_apps, notes, sms, subscriber, wifi,
        },
        backup::manifest::BackupIndex,
    },
};
use crate::structs::toml::OrchardToml;
use log::{error, info, warn};
use std::path::Path;

/// Parse the TOML collector and run every artifact against the backup
pub(crate) fn collection(toml_data: &[u8]) -> Result<(), CollectionError> {
    let collector = match OrchardToml::parse_orchard_toml(toml_data) {
        Ok(results) => results,
        Err(err) => {
            error!("[core] Orchard failed to parse TOML data: {err:?}");
            return Err(CollectionError::BadToml);
        }
    };
    collect(&collector)
}

/**
 * Open the Backup Index once and run each artifact in order.
 * A backup that cannot be opened aborts the collection. A failing artifact is logged and the next one runs
 */
pub(crate) fn collect(collector: &OrchardToml) -> Result<(), CollectionError> {
    let index = match BackupIndex::open(Path::new(&collector.backup.path)) {
        Ok(result) => result,
        Err(err) => {
            error!(
                "[core] Could not open backup at {}: {err:?}",
                collector.backup.path
            );
            return Err(CollectionError::Backup);
        }
    };
    let output = &collector.output;

    // Loop through all supported iOS artifacts
    for artifacts in &collector.artifacts {
        let query = artifacts.query.as_deref();
        let name = artifacts.artifact_name.as_str();
        let results = match name {
            "device_info" => device_info(&index, output),
            "backup_files" => backup_files(&index, output),
            "contacts" => contacts(&index, output, query),
            "calendar" => calendar(&index, output, artifacts.calendar.as_ref()),
            "call_history" => call_history(&index, output),
            "call_recents" => call_recents(&index, output),
            "sms" => sms(&index, output, query),
            "kakaotalk" => kakaotalk(&index, output, query),
            "line" => line(&index, output, query),
            "instagram_account" => instagram_account(&index, output),
            "instagram_direct" => instagram_direct(&index, output),
            "instagram_following" => instagram_following(&index, output),
            "notes" => notes(&index, output, query),
            "safari_history" => safari_history(&index, output, query),
            "safari_bookmarks" => safari_bookmarks(&index, output),
            "safari_thumbnails" => safari_thumbnails(&index, output),
            "chrome_sessions" => chrome_sessions(&index, output),
            "wifi" => wifi(&index, output),
            "bluetooth" => bluetooth(&index, output),
            "accounts" => accounts(&index, output),
            "subscriber" => subscriber(&index, output),
            "installed_apps" => installed_apps(&index, output),
            _ => {
                warn!("[core] Unsupported artifact: {name}");
                continue;
            }
        };
        match results {
            Ok(_) => info!("Collected {name}"),
            Err(err) => {
                error!("[core] Failed to parse {name}, error: {err:?}");
                continue;
            }
        }
    }

    index.close();
    Ok(())
}
