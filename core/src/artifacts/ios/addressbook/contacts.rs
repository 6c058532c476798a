/**
 * Parse the iOS AddressBook database
 * `ABPerson` columns change between iOS versions so the column set is probed before querying.
 * Multi-values (phones, emails, addresses) are joined through `ABMultiValue` and `ABMultiValueLabel`
 */
use super::{
    error::AddressBookError,
    phone::{format_phone, EMAIL_LABELS, PHONE_LABELS},
};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, has_table, open_sqlite, table_columns, value_f64, value_i64, value_text},
        strings::{contains_insensitive, normalize_nfc},
        time::convert_date,
    },
};
use common::ios::Contact;
use log::{error, warn};
use rusqlite::{types::Value, Connection};
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

pub(crate) const ADDRESSBOOK: [(&str, &str); 2] = [
    ("HomeDomain", "Library/AddressBook/AddressBook.sqlitedb"),
    ("HomeDomain", "private/var/mobile/Library/AddressBook/AddressBook.sqlitedb"),
];
const ADDRESSBOOK_IMAGES: [(&str, &str); 2] = [
    ("HomeDomain", "Library/AddressBook/AddressBookImages.sqlitedb"),
    ("HomeDomain", "private/var/mobile/Library/AddressBook/AddressBookImages.sqlitedb"),
];

/// Columns always present in the output, NULL if the database lacks them
const BASE_COLUMNS: [&str; 5] = ["ROWID", "First", "Last", "Organization", "Note"];

/// Locate `AddressBook.sqlitedb` in the backup
pub(crate) fn addressbook_path(index: &BackupIndex) -> Option<PathBuf> {
    if let Ok(path) = index.resolve_any(&ADDRESSBOOK) {
        return Some(path);
    }
    let entries = index.find_by_keyword("AddressBook.sqlitedb", None).ok()?;
    entries
        .iter()
        .filter(|entry| entry.relative_path.ends_with("/AddressBook.sqlitedb"))
        .find_map(|entry| index.resolve_file_id(&entry.file_id).ok())
}

/// Load every contact in the backup AddressBook
pub fn load_contacts(index: &BackupIndex) -> Result<Vec<Contact>, AddressBookError> {
    let path = match addressbook_path(index) {
        Some(result) => result,
        None => {
            warn!("[addressbook] AddressBook.sqlitedb not found in backup");
            return Err(AddressBookError::ArtifactAbsent);
        }
    };

    let conn = match open_sqlite(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[addressbook] Failed to open AddressBook: {err:?}");
            return Err(AddressBookError::SqliteParse);
        }
    };

    let mut contacts = person_query(&conn)?;
    let values = multi_value_query(&conn);
    for contact in contacts.iter_mut() {
        if let Some(labels) = values.get(&contact.rowid) {
            for (label, value) in labels {
                contact
                    .values_by_label
                    .entry(label.clone())
                    .or_default()
                    .push(value.clone());
            }
        }
    }

    if let Ok(image_path) = index.resolve_any(&ADDRESSBOOK_IMAGES) {
        let images = image_query(&image_path);
        for contact in contacts.iter_mut() {
            contact.image = images.get(&contact.rowid).cloned();
        }
    }

    Ok(contacts)
}

/// Query `ABPerson` using the observed column set
fn person_query(conn: &Connection) -> Result<Vec<Contact>, AddressBookError> {
    let observed = table_columns(conn, "ABPerson");
    if observed.is_empty() {
        error!("[addressbook] ABPerson table missing");
        return Err(AddressBookError::SchemaDrift);
    }

    let extras: BTreeSet<&str> = observed
        .iter()
        .map(String::as_str)
        .filter(|column| !BASE_COLUMNS.contains(column))
        .collect();
    let mut known: Vec<&str> = BASE_COLUMNS.to_vec();
    known.extend(extras.iter());

    let rowid = if observed.contains("ROWID") {
        "\"ROWID\""
    } else {
        "rowid AS \"ROWID\""
    };
    let projection = column_projection(&observed, &known[1..], "");
    let query = format!("SELECT {rowid}, {projection} FROM ABPerson ORDER BY 1");

    let statement = conn.prepare(&query);
    let mut stmt = match statement {
        Ok(result) => result,
        Err(err) => {
            error!("[addressbook] Failed to compose ABPerson query: {err:?}");
            return Err(AddressBookError::BadSQL);
        }
    };

    let rows_result = stmt.query_map([], |row| {
        let mut contact = Contact {
            rowid: value_i64(row, "ROWID").unwrap_or_default(),
            first: normalize_nfc(&value_text(row, "First")),
            last: normalize_nfc(&value_text(row, "Last")),
            organization: normalize_nfc(&value_text(row, "Organization")),
            note: normalize_nfc(&value_text(row, "Note")),
            ..Default::default()
        };

        for column in &extras {
            match *column {
                "CreationDate" => contact.creation = value_f64(row, column).and_then(convert_date),
                "ModificationDate" => {
                    contact.modification = value_f64(row, column).and_then(convert_date);
                }
                "GUID" => contact.guid = value_text(row, column),
                _ => {
                    let value: Value = row.get(*column).unwrap_or(Value::Null);
                    if matches!(value, Value::Null | Value::Blob(_)) {
                        continue;
                    }
                    contact
                        .extra
                        .insert(column.to_string(), normalize_nfc(&value_text(row, column)));
                }
            }
        }
        Ok(contact)
    });

    let mut contacts = Vec::new();
    match rows_result {
        Ok(rows) => {
            for row in rows {
                match row {
                    Ok(contact) => contacts.push(contact),
                    Err(err) => warn!("[addressbook] Skipping ABPerson row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[addressbook] Failed to query ABPerson: {err:?}");
            return Err(AddressBookError::BadSQL);
        }
    }
    Ok(contacts)
}

/// Get `(label, value)` pairs per `record_id`
fn multi_value_query(conn: &Connection) -> HashMap<i64, Vec<(String, String)>> {
    let mut values: HashMap<i64, Vec<(String, String)>> = HashMap::new();
    let has_labels = has_table(conn, "ABMultiValueLabel");
    let query = if has_labels {
        "SELECT mv.record_id AS record_id, mv.value AS value, IFNULL(l.value, '') AS label FROM ABMultiValue mv LEFT JOIN ABMultiValueLabel l ON mv.label = l.ROWID ORDER BY mv.UID"
    } else {
        "SELECT record_id, value, '' AS label FROM ABMultiValue"
    };

    let mut stmt = match conn.prepare(query) {
        Ok(result) => result,
        Err(err) => {
            warn!("[addressbook] No multi-values available: {err:?}");
            return values;
        }
    };

    let rows = stmt.query_map([], |row| {
        Ok((
            value_i64(row, "record_id").unwrap_or_default(),
            normalize_nfc(&value_text(row, "label")),
            normalize_nfc(&value_text(row, "value")),
        ))
    });
    match rows {
        Ok(row_iter) => {
            for (record_id, label, value) in row_iter.flatten() {
                if value.is_empty() {
                    continue;
                }
                values.entry(record_id).or_default().push((label, value));
            }
        }
        Err(err) => warn!("[addressbook] Failed to query ABMultiValue: {err:?}"),
    }
    values
}

/// Load contact images keyed by `record_id`
fn image_query(path: &Path) -> HashMap<i64, Vec<u8>> {
    let mut images = HashMap::new();
    let conn = match open_sqlite(path) {
        Ok(result) => result,
        Err(err) => {
            warn!("[addressbook] Failed to open AddressBookImages: {err:?}");
            return images;
        }
    };

    for table in ["ABFullSizeImage", "ABThumbnailImage"] {
        if !has_table(&conn, table) {
            continue;
        }
        let query = format!("SELECT record_id, data FROM {table} WHERE data IS NOT NULL");
        let mut stmt = match conn.prepare(&query) {
            Ok(result) => result,
            Err(err) => {
                warn!("[addressbook] Failed to compose {table} query: {err:?}");
                continue;
            }
        };
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>("record_id")?, row.get::<_, Vec<u8>>("data")?))
        });
        if let Ok(row_iter) = rows {
            for (record_id, data) in row_iter.flatten() {
                images.entry(record_id).or_insert(data);
            }
        }
    }
    images
}

/// Phone numbers of a contact, formatted
pub fn phone_numbers(contact: &Contact) -> Vec<String> {
    let mut numbers = Vec::new();
    for label in PHONE_LABELS {
        if let Some(values) = contact.values_by_label.get(label) {
            for value in values {
                // Unlabeled values hold both phones and emails
                if label.is_empty() && value.contains('@') {
                    continue;
                }
                numbers.push(format_phone(value));
            }
        }
    }
    numbers
}

/// Email addresses of a contact
pub fn emails(contact: &Contact) -> Vec<String> {
    let mut addresses = Vec::new();
    for label in EMAIL_LABELS {
        if let Some(values) = contact.values_by_label.get(label) {
            for value in values {
                if label.is_empty() && !value.contains('@') {
                    continue;
                }
                addresses.push(value.clone());
            }
        }
    }
    addresses
}

/// The first phone number of a contact
pub fn get_phone_number(contact: &Contact) -> Option<String> {
    phone_numbers(contact).into_iter().next()
}

/// Display name built from first and last name
pub(crate) fn display_name(first: &str, last: &str) -> String {
    let parts: Vec<&str> = [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    parts.join(" ")
}

/// Case-insensitive substring search over name, phone (dashes stripped) and organization
pub fn search_contacts<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    let needle = query.trim();
    if needle.is_empty() {
        return contacts.iter().collect();
    }
    let phone_needle = needle.replace('-', "");

    contacts
        .iter()
        .filter(|contact| {
            let name = display_name(&contact.first, &contact.last);
            let reversed = format!("{}{}", contact.last, contact.first);
            if contains_insensitive(&name, needle) || contains_insensitive(&reversed, needle) {
                return true;
            }
            if contains_insensitive(&contact.organization, needle) {
                return true;
            }
            if phone_needle.is_empty() {
                return false;
            }
            phone_numbers(contact)
                .iter()
                .any(|number| number.replace('-', "").contains(&phone_needle))
        })
        .collect()
}
