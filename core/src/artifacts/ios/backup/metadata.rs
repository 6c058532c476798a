use super::error::BackupError;
use crate::artifacts::ios::plist::property_list::{
    get_boolean, get_dictionary, get_string, parse_plist_file,
};
use crate::utils::time::plist_date_to_datetime;
use common::ios::BackupMetadata;
use log::error;
use plist::Dictionary;
use std::path::Path;

/// Parse `Manifest.plist` for backup and device metadata
pub(crate) fn parse_manifest_plist(path: &Path) -> Result<BackupMetadata, BackupError> {
    let plist_result = parse_plist_file(path);
    let manifest = match plist_result.and_then(|value| get_dictionary(&value)) {
        Ok(result) => result,
        Err(err) => {
            error!("[backup] Could not parse Manifest.plist: {err:?}");
            return Err(BackupError::Corrupt);
        }
    };

    let mut metadata = BackupMetadata::default();
    for (key, value) in &manifest {
        match key.as_str() {
            "IsEncrypted" => metadata.is_encrypted = get_boolean(value).unwrap_or_default(),
            "Version" => metadata.version = get_string(value).unwrap_or_default(),
            "Date" => metadata.date = value.as_date().map(|date| plist_date_to_datetime(&date)),
            "SystemDomainsVersion" => {
                metadata.system_domains_version = get_string(value).unwrap_or_default();
            }
            "WasPasscodeSet" => {
                metadata.was_passcode_set = get_boolean(value).unwrap_or_default();
            }
            "Lockdown" => {
                if let Ok(lockdown) = get_dictionary(value) {
                    lockdown_info(&lockdown, &mut metadata);
                }
            }
            _ => {}
        }
    }

    Ok(metadata)
}

/// Device identity stored in the `Lockdown` dictionary
fn lockdown_info(lockdown: &Dictionary, metadata: &mut BackupMetadata) {
    for (key, value) in lockdown {
        let text = match get_string(value) {
            Ok(result) => result,
            Err(_) => continue,
        };
        match key.as_str() {
            "DeviceName" => metadata.device_name = text,
            "ProductType" => metadata.product_type = text,
            "ProductVersion" => metadata.product_version = text,
            "BuildVersion" => metadata.build_version = text,
            "SerialNumber" => metadata.serial_number = text,
            "UniqueDeviceID" => metadata.unique_device_id = text,
            _ => {}
        }
    }
}
