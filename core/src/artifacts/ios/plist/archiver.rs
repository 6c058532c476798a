/**
 * NSKeyedArchiver plists store a flat `$objects` array and reference entries by UID.
 * The archive is loaded once into an arena and every UID is resolved by index.
 *
 * References:
 *   `https://developer.apple.com/documentation/foundation/nskeyedarchiver`
 */
use super::{error::PlistError, property_list::parse_plist_data};
use crate::utils::{strings::normalize_nfc, time::plist_date_to_datetime};
use chrono::{DateTime, Utc};
use log::warn;
use plist::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArchiveObject {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    Uid(usize),
    Dict(BTreeMap<String, ArchiveObject>),
    Array(Vec<ArchiveObject>),
}

static NULL_OBJECT: ArchiveObject = ArchiveObject::Null;

impl ArchiveObject {
    /// Convert a `plist` value into an arena entry. Strings are NFC normalized
    fn from_value(value: &Value) -> ArchiveObject {
        match value {
            Value::String(text) if text == "$null" => ArchiveObject::Null,
            Value::String(text) => ArchiveObject::String(normalize_nfc(text)),
            Value::Boolean(flag) => ArchiveObject::Bool(*flag),
            Value::Integer(number) => match number.as_signed() {
                Some(result) => ArchiveObject::Int(result),
                None => ArchiveObject::Int(number.as_unsigned().unwrap_or_default() as i64),
            },
            Value::Real(number) => ArchiveObject::Float(*number),
            Value::Data(data) => ArchiveObject::Bytes(data.clone()),
            Value::Date(date) => ArchiveObject::Date(plist_date_to_datetime(date)),
            Value::Uid(uid) => ArchiveObject::Uid(uid.get() as usize),
            Value::Dictionary(dict) => {
                let mut entries = BTreeMap::new();
                for (key, entry) in dict {
                    entries.insert(normalize_nfc(key), ArchiveObject::from_value(entry));
                }
                ArchiveObject::Dict(entries)
            }
            Value::Array(values) => {
                ArchiveObject::Array(values.iter().map(ArchiveObject::from_value).collect())
            }
            _ => ArchiveObject::Null,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            ArchiveObject::String(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            ArchiveObject::Int(number) => Some(*number),
            ArchiveObject::Float(number) => Some(*number as i64),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            ArchiveObject::Int(number) => Some(*number as f64),
            ArchiveObject::Float(number) => Some(*number),
            _ => None,
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            ArchiveObject::Bool(flag) => Some(*flag),
            ArchiveObject::Int(number) => Some(*number != 0),
            _ => None,
        }
    }

    pub(crate) fn is_dict(&self) -> bool {
        matches!(self, ArchiveObject::Dict(_))
    }

    /// Render primitives as text. Containers and null return `None`
    pub(crate) fn render(&self) -> Option<String> {
        match self {
            ArchiveObject::String(text) => Some(text.clone()),
            ArchiveObject::Int(number) => Some(number.to_string()),
            ArchiveObject::Float(number) => Some(number.to_string()),
            ArchiveObject::Bool(flag) => Some(flag.to_string()),
            ArchiveObject::Date(date) => Some(date.to_rfc3339()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct KeyedArchive {
    top: BTreeMap<String, ArchiveObject>,
    objects: Vec<ArchiveObject>,
}

impl KeyedArchive {
    /// Parse keyed archive bytes (binary or XML `plist`)
    pub(crate) fn parse(data: &[u8]) -> Result<KeyedArchive, PlistError> {
        let value = parse_plist_data(data)?;
        KeyedArchive::from_value(&value)
    }

    pub(crate) fn from_value(value: &Value) -> Result<KeyedArchive, PlistError> {
        let dict = match value.as_dictionary() {
            Some(result) => result,
            None => return Err(PlistError::NotArchive),
        };

        let objects = match dict.get("$objects").and_then(Value::as_array) {
            Some(result) => result.iter().map(ArchiveObject::from_value).collect(),
            None => return Err(PlistError::NotArchive),
        };

        let mut top = BTreeMap::new();
        if let Some(top_dict) = dict.get("$top").and_then(Value::as_dictionary) {
            for (key, entry) in top_dict {
                top.insert(key.clone(), ArchiveObject::from_value(entry));
            }
        }

        Ok(KeyedArchive { top, objects })
    }

    pub(crate) fn objects(&self) -> &[ArchiveObject] {
        &self.objects
    }

    /// Resolve an object by its `$objects` index
    pub(crate) fn object(&self, index: usize) -> Result<&ArchiveObject, PlistError> {
        match self.objects.get(index) {
            Some(result) => Ok(self.resolve(result)),
            None => Err(PlistError::BadUid),
        }
    }

    /// Follow UID references until a concrete object is reached.
    /// Chains longer than the arena, or UIDs out of range, resolve to null
    pub(crate) fn resolve<'a>(&'a self, object: &'a ArchiveObject) -> &'a ArchiveObject {
        let mut current = object;
        let mut hops = 0;
        while let ArchiveObject::Uid(index) = current {
            if hops > self.objects.len() {
                warn!("[archiver] UID chain did not terminate");
                return &NULL_OBJECT;
            }
            current = match self.objects.get(*index) {
                Some(result) => result,
                None => {
                    warn!("[archiver] UID {index} outside of $objects");
                    return &NULL_OBJECT;
                }
            };
            hops += 1;
        }
        current
    }

    /// Resolve a `$top` entry such as `root`
    pub(crate) fn top(&self, key: &str) -> Option<&ArchiveObject> {
        self.top.get(key).map(|object| self.resolve(object))
    }

    /// Get a resolved value from a dictionary object. Handles `NS.keys`/`NS.objects` dictionaries
    pub(crate) fn dict_get<'a>(&'a self, dict: &'a ArchiveObject, key: &str) -> Option<&'a ArchiveObject> {
        let entries = match self.resolve(dict) {
            ArchiveObject::Dict(entries) => entries,
            _ => return None,
        };
        if let Some(value) = entries.get(key) {
            return Some(self.resolve(value));
        }
        self.flatten(dict).remove(key)
    }

    /// Flatten a dictionary object into key to resolved value pairs.
    /// Archived NSDictionary objects are rebuilt from their parallel `NS.keys` and `NS.objects` arrays
    pub(crate) fn flatten<'a>(&'a self, dict: &'a ArchiveObject) -> BTreeMap<String, &'a ArchiveObject> {
        let mut flat = BTreeMap::new();
        let entries = match self.resolve(dict) {
            ArchiveObject::Dict(entries) => entries,
            _ => return flat,
        };

        if let (Some(ArchiveObject::Array(keys)), Some(ArchiveObject::Array(values))) = (
            entries.get("NS.keys").map(|value| self.resolve(value)),
            entries.get("NS.objects").map(|value| self.resolve(value)),
        ) {
            for (key, value) in keys.iter().zip(values.iter()) {
                if let Some(name) = self.resolve(key).as_str() {
                    flat.insert(name.to_string(), self.resolve(value));
                }
            }
            return flat;
        }

        for (key, value) in entries {
            if key == "$class" {
                continue;
            }
            flat.insert(key.clone(), self.resolve(value));
        }
        flat
    }

    /// Get the resolved items of an array object or an archived NSArray
    pub(crate) fn array_items<'a>(&'a self, array: &'a ArchiveObject) -> Vec<&'a ArchiveObject> {
        match self.resolve(array) {
            ArchiveObject::Array(items) => items.iter().map(|item| self.resolve(item)).collect(),
            ArchiveObject::Dict(entries) => match entries.get("NS.objects").map(|value| self.resolve(value)) {
                Some(ArchiveObject::Array(items)) => {
                    items.iter().map(|item| self.resolve(item)).collect()
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Get object text. Archived NSString/NSMutableString store it under `NS.string`
    pub(crate) fn string(&self, object: &ArchiveObject) -> Option<String> {
        let resolved = self.resolve(object);
        match resolved {
            ArchiveObject::String(text) => Some(text.clone()),
            ArchiveObject::Dict(_) => match self.dict_get(resolved, "NS.string") {
                Some(ArchiveObject::String(text)) => Some(text.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ArchiveObject, KeyedArchive};
    use plist::{Dictionary, Uid, Value};

    /// Build a keyed archive `plist` from an `$objects` list and a `$top` root UID
    pub(crate) fn build_archive(objects: Vec<Value>, root: u64) -> Vec<u8> {
        let mut top = Dictionary::new();
        top.insert(String::from("root"), Value::Uid(Uid::new(root)));

        let mut archive = Dictionary::new();
        archive.insert(String::from("$archiver"), Value::String(String::from("NSKeyedArchiver")));
        archive.insert(String::from("$version"), Value::Integer(100000.into()));
        archive.insert(String::from("$top"), Value::Dictionary(top));
        archive.insert(String::from("$objects"), Value::Array(objects));

        let mut buffer = Vec::new();
        Value::Dictionary(archive).to_writer_binary(&mut buffer).unwrap();
        buffer
    }

    pub(crate) fn uid(index: u64) -> Value {
        Value::Uid(Uid::new(index))
    }

    pub(crate) fn dict(entries: Vec<(&str, Value)>) -> Value {
        let mut dict = Dictionary::new();
        for (key, value) in entries {
            dict.insert(key.to_string(), value);
        }
        Value::Dictionary(dict)
    }

    #[test]
    fn test_resolve_nsdictionary() {
        let objects = vec![
            Value::String(String::from("$null")),
            dict(vec![
                ("NS.keys", Value::Array(vec![uid(2), uid(3)])),
                ("NS.objects", Value::Array(vec![uid(4), uid(5)])),
                ("$class", uid(6)),
            ]),
            Value::String(String::from("username")),
            Value::String(String::from("pk")),
            Value::String(String::from("minsu")),
            Value::Integer(42.into()),
            dict(vec![("$classname", Value::String(String::from("NSDictionary")))]),
        ];
        let data = build_archive(objects, 1);
        let archive = KeyedArchive::parse(&data).unwrap();

        let root = archive.top("root").unwrap();
        assert_eq!(archive.dict_get(root, "username").unwrap().as_str(), Some("minsu"));
        assert_eq!(archive.dict_get(root, "pk").unwrap().as_i64(), Some(42));
        assert_eq!(archive.flatten(root).len(), 2);
        assert_eq!(archive.object(0).unwrap(), &ArchiveObject::Null);
    }

    #[test]
    fn test_uid_out_of_range() {
        let objects = vec![
            Value::String(String::from("$null")),
            dict(vec![("name", uid(99))]),
        ];
        let data = build_archive(objects, 1);
        let archive = KeyedArchive::parse(&data).unwrap();
        let root = archive.top("root").unwrap();
        assert_eq!(archive.dict_get(root, "name"), Some(&ArchiveObject::Null));
        assert!(archive.object(50).is_err());
    }

    #[test]
    fn test_uid_self_reference_terminates() {
        let objects = vec![uid(1), uid(0)];
        let data = build_archive(objects, 0);
        let archive = KeyedArchive::parse(&data).unwrap();
        assert_eq!(archive.top("root"), Some(&ArchiveObject::Null));
    }

    #[test]
    fn test_array_items_and_strings() {
        let objects = vec![
            Value::String(String::from("$null")),
            dict(vec![("NS.objects", Value::Array(vec![uid(2), uid(3)]))]),
            Value::String(String::from("\u{1100}\u{1161}")),
            dict(vec![("NS.string", Value::String(String::from("b")))]),
        ];
        let data = build_archive(objects, 1);
        let archive = KeyedArchive::parse(&data).unwrap();
        let root = archive.top("root").unwrap();
        let items = archive.array_items(root);
        assert_eq!(items.len(), 2);
        assert_eq!(archive.string(items[0]).unwrap(), "\u{ac00}");
        assert_eq!(archive.string(items[1]).unwrap(), "b");
    }

    #[test]
    #[should_panic(expected = "NotArchive")]
    fn test_not_archive() {
        let mut buffer = Vec::new();
        Value::Array(Vec::new()).to_writer_binary(&mut buffer).unwrap();
        KeyedArchive::parse(&buffer).unwrap();
    }
}
