/**
 * Newer iOS versions wrap `ZADDRESS` for some services (FaceTime, third party VoIP).
 * The column may hold a plain handle, base64 encoded UTF8, or base64 encoded JSON with a `threadDisplayName`
 */
use crate::utils::{encoding::base64_decode_standard, strings::printable_ratio};
use serde_json::{Map, Value};

#[derive(Debug, PartialEq)]
pub(crate) enum Decodable {
    Plain(String),
    Base64Utf8(String),
    Base64Json(Map<String, Value>),
}

impl Decodable {
    /// Try each encoding in order and keep the first one that is well formed
    pub(crate) fn decode(raw: &str) -> Decodable {
        let trimmed = raw.trim();
        if looks_like_handle(trimmed) {
            return Decodable::Plain(trimmed.to_string());
        }

        let bytes = match base64_decode_standard(trimmed) {
            Ok(result) => result,
            Err(_) => return Decodable::Plain(trimmed.to_string()),
        };
        let text = match String::from_utf8(bytes) {
            Ok(result) => result,
            Err(_) => return Decodable::Plain(trimmed.to_string()),
        };

        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text) {
            return Decodable::Base64Json(map);
        }
        if !text.is_empty() && printable_ratio(&text) >= 0.9 {
            return Decodable::Base64Utf8(text);
        }
        Decodable::Plain(trimmed.to_string())
    }

    /// Display string for the handle
    pub(crate) fn display(&self) -> String {
        match self {
            Decodable::Plain(value) | Decodable::Base64Utf8(value) => value.clone(),
            Decodable::Base64Json(map) => match map.get("threadDisplayName") {
                Some(Value::String(name)) if !name.is_empty() => name.clone(),
                _ => Value::Object(map.clone()).to_string(),
            },
        }
    }

    pub(crate) fn is_wrapped(&self) -> bool {
        !matches!(self, Decodable::Plain(_))
    }
}

/// Phone numbers and email addresses are never base64
fn looks_like_handle(value: &str) -> bool {
    if value.is_empty() || value.contains('@') {
        return true;
    }
    value
        .chars()
        .all(|character| character.is_ascii_digit() || matches!(character, '+' | '-' | ' ' | '(' | ')'))
}
