/**
 * Device identity from the backup root `Info.plist`.
 * Only whitelisted keys are kept, the file also embeds large app metadata blobs
 */
use super::error::SystemError;
use crate::{
    artifacts::ios::{
        backup::manifest::BackupIndex,
        plist::property_list::{get_dictionary, parse_plist_file, value_to_string},
    },
    filesystem::{directory::directory_size, files::is_file},
};
use common::ios::DeviceInfo;
use log::{error, warn};
use plist::Dictionary;
use std::collections::BTreeMap;

const DEVICE_KEYS: [&str; 16] = [
    "DeviceName",
    "ProductType",
    "ProductVersion",
    "SerialNumber",
    "IMEI",
    "IMEI 2",
    "Phone Number",
    "Last Backup Date",
    "ICCID",
    "GUID",
    "Display Name",
    "Product Name",
    "Target Identifier",
    "Unique Identifier",
    "Target Type",
    "Build Version",
];

/// Parse `Info.plist` at the backup root
pub(crate) fn root_info(index: &BackupIndex) -> Result<Dictionary, SystemError> {
    let path = index.root().join("Info.plist");
    if !is_file(&path) {
        warn!("[device] Info.plist not found at backup root");
        return Err(SystemError::ArtifactAbsent);
    }
    match parse_plist_file(&path).and_then(|value| get_dictionary(&value)) {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[device] Could not parse Info.plist: {err:?}");
            Err(SystemError::Plist)
        }
    }
}

/// Get device identity plus file count and total size of the backup
pub fn device_info(index: &BackupIndex) -> Result<DeviceInfo, SystemError> {
    let info = root_info(index)?;
    let mut properties = BTreeMap::new();
    for key in DEVICE_KEYS {
        if let Some(value) = info.get(key) {
            properties.insert(key.to_string(), value_to_string(value));
        }
    }

    let number_of_files = match index.count_active_files() {
        Ok(result) => result,
        Err(err) => {
            error!("[device] Could not count backup files: {err:?}");
            return Err(SystemError::Catalog);
        }
    };

    Ok(DeviceInfo {
        properties,
        number_of_files,
        size_of_image: directory_size(index.root()),
    })
}
