use super::{
    database::{open_table, query_rows},
    error::SystemError,
};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, value_i64, value_text},
        strings::normalize_nfc,
        time::unixepoch_to_datetime,
    },
};
use common::ios::BluetoothDevice;

const BLUETOOTH_DOMAIN: &str = "SysSharedContainerDomain-systemgroup.com.apple.bluetooth";
const BLUETOOTH_PATH: &str = "Library/Database/com.apple.MobileBluetooth.ledevices.other.db";

/// Get Bluetooth LE devices seen by the phone. `LastSeenTime` is unixepoch seconds
pub fn bluetooth_devices(index: &BackupIndex) -> Result<Vec<BluetoothDevice>, SystemError> {
    let (conn, observed) = open_table(index, BLUETOOTH_DOMAIN, BLUETOOTH_PATH, "OtherDevices")?;
    let projection = column_projection(&observed, &["Uuid", "Name", "Address", "LastSeenTime"], "");
    let query = format!("SELECT {projection} FROM OtherDevices ORDER BY LastSeenTime DESC");

    query_rows(&conn, &query, |row| {
        Ok(BluetoothDevice {
            uuid: value_text(row, "Uuid"),
            name: normalize_nfc(&value_text(row, "Name")),
            address: value_text(row, "Address"),
            last_seen: value_i64(row, "LastSeenTime")
                .filter(|value| *value > 0)
                .and_then(unixepoch_to_datetime),
        })
    })
}
