/**
 * Installed applications.
 * The root `Info.plist` lists installed bundle ids and embeds an `iTunesMetadata` plist per app.
 * Apps without metadata fall back to any `Info.plist` in the backup carrying a `CFBundleIdentifier`
 */
use super::{device::root_info, error::SystemError};
use crate::artifacts::ios::{
    backup::{filter::EntryFilter, manifest::BackupIndex},
    plist::property_list::{dict_string, get_dictionary, parse_plist_data, parse_plist_file},
};
use common::ios::InstalledApp;
use log::warn;
use plist::{Dictionary, Value};
use std::collections::BTreeMap;

/// Get installed apps sorted by bundle id
pub fn installed_apps(index: &BackupIndex) -> Result<Vec<InstalledApp>, SystemError> {
    let mut apps = BTreeMap::new();
    let root = match root_info(index) {
        Ok(result) => Some(result),
        Err(SystemError::ArtifactAbsent) => None,
        Err(err) => return Err(err),
    };
    if let Some(info) = &root {
        metadata_apps(info, &mut apps);
    }

    plist_apps(index, &mut apps)?;
    if root.is_none() && apps.is_empty() {
        return Err(SystemError::ArtifactAbsent);
    }
    Ok(apps.into_values().collect())
}

/// Apps listed under `Installed Applications` with their `iTunesMetadata`
fn metadata_apps(info: &Dictionary, apps: &mut BTreeMap<String, InstalledApp>) {
    let installed = match info.get("Installed Applications") {
        Some(Value::Array(result)) => result,
        _ => return,
    };
    let applications = info
        .get("Applications")
        .and_then(|value| value.as_dictionary());

    for bundle in installed {
        let bundle_id = match bundle.as_string() {
            Some(result) => result.to_string(),
            None => continue,
        };
        let metadata = applications
            .and_then(|entries| entries.get(&bundle_id))
            .and_then(|entry| entry.as_dictionary())
            .and_then(|entry| entry.get("iTunesMetadata"))
            .and_then(|value| value.as_data())
            .and_then(|data| match parse_plist_data(data).and_then(|value| get_dictionary(&value)) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!("[apps] Bad iTunesMetadata for {bundle_id}: {err:?}");
                    None
                }
            });

        let app = match metadata {
            Some(itunes) => {
                let mut version = dict_string(&itunes, "bundleShortVersionString");
                if version.is_empty() {
                    version = dict_string(&itunes, "bundleVersion");
                }
                InstalledApp {
                    bundle_id: bundle_id.clone(),
                    name: dict_string(&itunes, "itemName"),
                    version,
                    source: String::from("iTunesMetadata"),
                }
            }
            None => InstalledApp {
                bundle_id: bundle_id.clone(),
                name: String::new(),
                version: String::new(),
                source: String::new(),
            },
        };
        apps.insert(bundle_id, app);
    }
}

/// Fill apps from every `Info.plist` in the backup that has no `iTunesMetadata` entry
fn plist_apps(
    index: &BackupIndex,
    apps: &mut BTreeMap<String, InstalledApp>,
) -> Result<(), SystemError> {
    let filter = EntryFilter::new().path_ends_with("Info.plist").files_only();
    let entries = match index.entries(&filter) {
        Ok(result) => result,
        Err(err) => {
            warn!("[apps] Could not list Info.plist files: {err:?}");
            return Err(SystemError::Catalog);
        }
    };

    for entry in entries {
        let path = match index.resolve_file_id(&entry.file_id) {
            Ok(result) => result,
            Err(_) => continue,
        };
        let plist = match parse_plist_file(&path).and_then(|value| get_dictionary(&value)) {
            Ok(result) => result,
            Err(err) => {
                warn!("[apps] Skipping {}: {err:?}", entry.relative_path);
                continue;
            }
        };
        let bundle_id = dict_string(&plist, "CFBundleIdentifier");
        if bundle_id.is_empty() {
            continue;
        }
        if let Some(existing) = apps.get(&bundle_id) {
            if existing.source == "iTunesMetadata" {
                continue;
            }
        }

        let mut name = dict_string(&plist, "CFBundleDisplayName");
        if name.is_empty() {
            name = dict_string(&plist, "CFBundleName");
        }
        apps.insert(
            bundle_id.clone(),
            InstalledApp {
                bundle_id,
                name,
                version: dict_string(&plist, "CFBundleShortVersionString"),
                source: String::from("Info.plist"),
            },
        );
    }
    Ok(())
}
