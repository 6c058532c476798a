use super::error::PlistError;
use crate::utils::{
    encoding::base64_encode_standard, strings::normalize_nfc, time::plist_date_to_datetime,
};
use log::error;
use plist::{Dictionary, Value};
use std::path::Path;

/// Parse a `plist` from given path and return a Value (any `plist` value)
pub(crate) fn parse_plist_file(path: &Path) -> Result<Value, PlistError> {
    let plist_result = plist::from_file(path);
    match plist_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[plist] Could not read plist file {}: {err:?}", path.display());
            Err(PlistError::File)
        }
    }
}

/// Parse a `plist` from bytes and return a Value (any `plist` value)
pub(crate) fn parse_plist_data(data: &[u8]) -> Result<Value, PlistError> {
    let plist_result = plist::from_bytes(data);
    match plist_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[plist] Could not parse plist data: {err:?}");
            Err(PlistError::File)
        }
    }
}

/// Return a `plist` value as dictionary
pub(crate) fn get_dictionary(plist_value: &Value) -> Result<Dictionary, PlistError> {
    let result = plist_value.as_dictionary();
    match result {
        Some(data) => Ok(data.clone()),
        None => Err(PlistError::Dictionary),
    }
}

/// Return a `plist` value as boolean
pub(crate) fn get_boolean(plist_value: &Value) -> Result<bool, PlistError> {
    let result = plist_value.as_boolean();
    match result {
        Some(data) => Ok(data),
        None => Err(PlistError::Bool),
    }
}

/// Return a `plist` value as NFC normalized string
pub(crate) fn get_string(plist_value: &Value) -> Result<String, PlistError> {
    let result = plist_value.as_string();
    match result {
        Some(data) => Ok(normalize_nfc(data)),
        None => Err(PlistError::String),
    }
}

/// Return a `plist value` as Vec<Value>
pub(crate) fn get_array(plist_value: &Value) -> Result<Vec<Value>, PlistError> {
    let result = plist_value.as_array();
    match result {
        Some(data) => Ok(data.clone()),
        None => Err(PlistError::Array),
    }
}

/// Render any primitive `plist` value as a string. Containers become empty strings
pub(crate) fn value_to_string(plist_value: &Value) -> String {
    match plist_value {
        Value::String(value) => normalize_nfc(value),
        Value::Boolean(value) => value.to_string(),
        Value::Integer(value) => match value.as_signed() {
            Some(number) => number.to_string(),
            None => value.as_unsigned().unwrap_or_default().to_string(),
        },
        Value::Real(value) => value.to_string(),
        Value::Date(value) => plist_date_to_datetime(value).to_rfc3339(),
        Value::Data(value) => base64_encode_standard(value),
        Value::Uid(value) => value.get().to_string(),
        _ => String::new(),
    }
}

/// Get a key from a dictionary rendered as string. Missing keys return an empty string
pub(crate) fn dict_string(dict: &Dictionary, key: &str) -> String {
    match dict.get(key) {
        Some(value) => value_to_string(value),
        None => String::new(),
    }
}
