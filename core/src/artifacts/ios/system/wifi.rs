/**
 * Parse known Wi-Fi networks from `com.apple.wifi-private-mac-networks.plist`
 * The private MAC is stored either as 6 raw bytes or a 12 character hex string
 */
use super::error::SystemError;
use crate::{
    artifacts::ios::{
        backup::manifest::BackupIndex,
        plist::property_list::{get_array, get_dictionary, parse_plist_file},
    },
    utils::{
        encoding::hex_string,
        strings::normalize_nfc,
        time::{apple_float_seconds, plist_date_to_datetime},
    },
};
use chrono::{DateTime, Utc};
use common::ios::WifiNetwork;
use log::{error, warn};
use plist::{Dictionary, Value};

const WIFI_DOMAIN: &str = "SystemPreferencesDomain";
const WIFI_PATH: &str = "SystemConfiguration/com.apple.wifi-private-mac-networks.plist";
const NETWORK_LIST: &str = "List of scanned networks with private mac";

/// Get the known Wi-Fi networks of the device
pub fn wifi_networks(index: &BackupIndex) -> Result<Vec<WifiNetwork>, SystemError> {
    let path = match index.resolve(WIFI_DOMAIN, WIFI_PATH) {
        Ok(result) => result,
        Err(err) => {
            warn!("[wifi] Wi-Fi plist not found: {err:?}");
            return Err(SystemError::ArtifactAbsent);
        }
    };
    let plist = match parse_plist_file(&path).and_then(|value| get_dictionary(&value)) {
        Ok(result) => result,
        Err(err) => {
            error!("[wifi] Could not parse Wi-Fi plist: {err:?}");
            return Err(SystemError::Plist);
        }
    };
    let networks = match plist.get(NETWORK_LIST).map(get_array) {
        Some(Ok(result)) => result,
        _ => {
            warn!("[wifi] Wi-Fi plist has no network list");
            return Ok(Vec::new());
        }
    };

    let mut results = Vec::new();
    for network in networks {
        let entry = match network.as_dictionary() {
            Some(result) => result,
            None => {
                warn!("[wifi] Skipping network that is not a dictionary");
                continue;
            }
        };
        results.push(WifiNetwork {
            ssid: ssid(entry),
            mac: mac_address(entry),
            last_joined: entry.get("lastJoined").and_then(plist_instant),
            added_at: entry.get("addedAt").and_then(plist_instant),
        });
    }
    Ok(results)
}

fn ssid(entry: &Dictionary) -> String {
    match entry.get("SSID_STR").or_else(|| entry.get("SSID")) {
        Some(Value::String(value)) => normalize_nfc(value),
        Some(Value::Data(value)) => normalize_nfc(&String::from_utf8_lossy(value)),
        _ => String::new(),
    }
}

fn mac_address(entry: &Dictionary) -> String {
    let value = match entry.get("PRIVATE_MAC_ADDRESS") {
        Some(Value::Dictionary(private)) => private.get("PRIVATE_MAC_ADDRESS_VALUE"),
        Some(other) => Some(other),
        None => entry.get("MAC"),
    };
    match value {
        Some(Value::Data(bytes)) if bytes.len() == 6 => hex_string(bytes, ":"),
        Some(Value::String(text)) => format_mac(text),
        _ => String::new(),
    }
}

/// Format a 12 character hex string as `aa:bb:cc:dd:ee:ff`. Anything else is returned as is
pub(crate) fn format_mac(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() != 12 || !trimmed.chars().all(|character| character.is_ascii_hexdigit()) {
        return trimmed.to_string();
    }
    trimmed
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_lowercase())
        .collect::<Vec<String>>()
        .join(":")
}

fn plist_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(plist_date_to_datetime(date)),
        Value::Real(seconds) => apple_float_seconds(*seconds),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{format_mac, wifi_networks, NETWORK_LIST, WIFI_DOMAIN, WIFI_PATH};
    use crate::utils::testing::{dict, string, TestBackup};
    use plist::Value;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac("A1B2C3D4E5F6"), "a1:b2:c3:d4:e5:f6");
        assert_eq!(format_mac("a1:b2:c3:d4:e5:f6"), "a1:b2:c3:d4:e5:f6");
    }

    #[test]
    fn test_wifi_networks() {
        let joined = UNIX_EPOCH + Duration::from_secs(1705280400);
        let networks = Value::Array(vec![
            dict(vec![
                ("SSID_STR", string("Home_5G")),
                (
                    "PRIVATE_MAC_ADDRESS",
                    dict(vec![(
                        "PRIVATE_MAC_ADDRESS_VALUE",
                        Value::Data(vec![0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]),
                    )]),
                ),
                ("lastJoined", Value::Date(joined.into())),
                ("addedAt", Value::Real(726973200.0)),
            ]),
            dict(vec![
                ("SSID", Value::Data(b"Cafe".to_vec())),
                ("PRIVATE_MAC_ADDRESS", string("AABBCCDDEEFF")),
            ]),
            string("junk"),
        ]);

        let mut backup = TestBackup::new();
        backup.add_plist(WIFI_DOMAIN, WIFI_PATH, &dict(vec![(NETWORK_LIST, networks)]));
        let index = backup.open();

        let results = wifi_networks(&index).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ssid, "Home_5G");
        assert_eq!(results[0].mac, "0a:1b:2c:3d:4e:5f");
        assert_eq!(results[0].last_joined.unwrap().timestamp(), 1705280400);
        assert_eq!(results[0].added_at.unwrap().timestamp(), 1705280400);
        assert_eq!(results[1].ssid, "Cafe");
        assert_eq!(results[1].mac, "aa:bb:cc:dd:ee:ff");
        assert!(results[1].last_joined.is_none());
    }
}
