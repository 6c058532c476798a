/**
 * An iTunes/Finder backup stores every file under `<root>/<fileID[0:2]>/<fileID>`.
 * `Manifest.db` maps `(domain, relativePath)` to the `fileID`, which is the SHA1 of `domain-relativePath`.
 * `Manifest.plist` holds the backup and device metadata.
 *
 * The catalog connection is opened once, cached behind a mutex and released on `close`
 */
use super::{error::BackupError, filter::EntryFilter, metadata::parse_manifest_plist};
use crate::{
    filesystem::files::{is_file, read_header},
    utils::{
        encoding::hex_string,
        sqlite::{open_sqlite, table_columns, value_text},
        strings::{normalize_nfc, unicode_forms},
    },
};
use common::ios::{BackupMetadata, FileEntry};
use log::{error, warn};
use rusqlite::{params_from_iter, Connection};
use sha1::{Digest, Sha1};
use std::{
    fs::read_dir,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// First 16 bytes of every readable SQLITE database
const SQLITE_MAGIC: [u8; 16] = *b"SQLite format 3\0";

pub struct BackupIndex {
    root: PathBuf,
    metadata: BackupMetadata,
    catalog: Mutex<Option<Connection>>,
}

impl BackupIndex {
    /**
     * Open a backup directory.
     *   Missing `Manifest.plist` or `Manifest.db` is `NotABackup`
     *   `Manifest.db` without the SQLITE magic is `Encrypted`
     *   A catalog without a readable `Files` table is `Corrupt`
     */
    pub fn open(path: &Path) -> Result<BackupIndex, BackupError> {
        let manifest_plist = path.join("Manifest.plist");
        let manifest_db = path.join("Manifest.db");
        if !is_file(&manifest_plist) || !is_file(&manifest_db) {
            warn!("[backup] {} is missing Manifest.plist or Manifest.db", path.display());
            return Err(BackupError::NotABackup);
        }

        match read_header(&manifest_db, SQLITE_MAGIC.len()) {
            Ok(header) if header == SQLITE_MAGIC => {}
            _ => {
                error!("[backup] Manifest.db at {} is not SQLITE. Encrypted backups are not supported", path.display());
                return Err(BackupError::Encrypted);
            }
        }

        let metadata = parse_manifest_plist(&manifest_plist)?;
        let conn = open_catalog(path)?;
        if metadata.is_encrypted {
            warn!("[backup] Manifest.plist marks the backup as encrypted but Manifest.db is readable");
        }

        Ok(BackupIndex {
            root: path.to_path_buf(),
            metadata,
            catalog: Mutex::new(Some(conn)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &BackupMetadata {
        &self.metadata
    }

    /// Release the cached catalog handle. Later queries reopen it
    pub fn close(&self) {
        match self.catalog.lock() {
            Ok(mut guard) => *guard = None,
            Err(err) => error!("[backup] Catalog lock poisoned on close: {err:?}"),
        }
    }

    /// Run a closure against the cached catalog connection
    fn with_catalog<T>(
        &self,
        action: impl FnOnce(&Connection) -> Result<T, BackupError>,
    ) -> Result<T, BackupError> {
        let mut guard = match self.catalog.lock() {
            Ok(result) => result,
            Err(err) => {
                error!("[backup] Catalog lock poisoned: {err:?}");
                return Err(BackupError::Poisoned);
            }
        };

        if guard.is_none() {
            *guard = Some(open_catalog(&self.root)?);
        }
        match guard.as_ref() {
            Some(conn) => action(conn),
            None => Err(BackupError::Corrupt),
        }
    }

    /// Blob path of a `fileID`. Only returned if the blob exists on disk
    pub fn resolve_file_id(&self, file_id: &str) -> Result<PathBuf, BackupError> {
        if file_id.len() < 2 || !file_id.is_ascii() {
            return Err(BackupError::NotFound);
        }
        let path = self.root.join(&file_id[0..2]).join(file_id);
        if is_file(&path) {
            return Ok(path);
        }
        Err(BackupError::NotFound)
    }

    /// Find a blob on disk whose `fileID` starts with `prefix` and ends with `suffix`
    pub fn find_blob(&self, prefix: &str, suffix: &str) -> Result<PathBuf, BackupError> {
        if prefix.len() < 2 || !prefix.is_ascii() {
            return Err(BackupError::NotFound);
        }
        let bucket = self.root.join(&prefix[0..2]);
        let dir_entries = match read_dir(&bucket) {
            Ok(result) => result,
            Err(err) => {
                warn!("[backup] No blob directory {}: {err:?}", bucket.display());
                return Err(BackupError::NotFound);
            }
        };

        let mut names: Vec<String> = dir_entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
            .collect();
        names.sort();
        for name in names {
            if let Ok(path) = self.resolve_file_id(&name) {
                return Ok(path);
            }
        }
        Err(BackupError::NotFound)
    }

    /**
     * Resolve a logical file to its blob path.
     * The catalog is consulted first, then the computed `fileID` of each NFC/NFD spelling is tried.
     * Enumerated entries carry NFC text, so an NFD catalog row resolves through the stored `fileID`
     */
    pub fn resolve(&self, domain: &str, relative_path: &str) -> Result<PathBuf, BackupError> {
        let filter = EntryFilter::new().domain(domain).path(relative_path);
        let mut file_ids = Vec::new();
        self.enumerate(&filter, |entry| file_ids.push(entry.file_id))?;

        for domain_form in unicode_forms(domain) {
            for path_form in unicode_forms(relative_path) {
                let id = file_id(&domain_form, &path_form);
                if !file_ids.contains(&id) {
                    file_ids.push(id);
                }
            }
        }
        for id in &file_ids {
            if let Ok(path) = self.resolve_file_id(id) {
                return Ok(path);
            }
        }
        Err(BackupError::NotFound)
    }

    /// Resolve the first `(domain, relativePath)` candidate that exists
    pub fn resolve_any(&self, candidates: &[(&str, &str)]) -> Result<PathBuf, BackupError> {
        for (domain, relative_path) in candidates {
            match self.resolve(domain, relative_path) {
                Ok(path) => return Ok(path),
                Err(BackupError::NotFound) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(BackupError::NotFound)
    }

    /// Stream catalog rows matching the filter to the callback. The filter is applied in SQL
    pub fn enumerate<F>(&self, filter: &EntryFilter, mut callback: F) -> Result<(), BackupError>
    where
        F: FnMut(FileEntry),
    {
        let (where_clause, params) = filter.where_clause();
        let query = format!(
            "SELECT fileID, domain, relativePath, flags FROM Files{where_clause}"
        );

        self.with_catalog(|conn| {
            let statement = conn.prepare(&query);
            let mut stmt = match statement {
                Ok(result) => result,
                Err(err) => {
                    error!("[backup] Failed to compose catalog query: {err:?}");
                    return Err(BackupError::BadSQL);
                }
            };

            let rows_result = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok(FileEntry {
                    file_id: value_text(row, "fileID"),
                    domain: normalize_nfc(&value_text(row, "domain")),
                    relative_path: normalize_nfc(&value_text(row, "relativePath")),
                    flags: row.get("flags").unwrap_or_default(),
                })
            });
            let rows = match rows_result {
                Ok(result) => result,
                Err(err) => {
                    error!("[backup] Failed to query catalog: {err:?}");
                    return Err(BackupError::Corrupt);
                }
            };

            for row in rows {
                match row {
                    Ok(entry) => callback(entry),
                    Err(err) => warn!("[backup] Skipping unreadable catalog row: {err:?}"),
                }
            }
            Ok(())
        })
    }

    /// Collect catalog rows matching the filter
    pub fn entries(&self, filter: &EntryFilter) -> Result<Vec<FileEntry>, BackupError> {
        let mut entries = Vec::new();
        self.enumerate(filter, |entry| entries.push(entry))?;
        Ok(entries)
    }

    /// Substring search on `relativePath` with an optional extension filter (`"db"` or `".db"`)
    pub fn find_by_keyword(
        &self,
        keyword: &str,
        extension: Option<&str>,
    ) -> Result<Vec<FileEntry>, BackupError> {
        let mut filter = EntryFilter::new().path_contains(keyword);
        if let Some(ext) = extension {
            let suffix = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{ext}")
            };
            filter = filter.path_ends_with(&suffix);
        }
        self.entries(&filter)
    }

    /// Count catalog entries that are not directories
    pub fn count_active_files(&self) -> Result<u64, BackupError> {
        self.with_catalog(|conn| {
            let count_result = conn.query_row(
                "SELECT COUNT(*) FROM Files WHERE IFNULL(flags, 0) != 2",
                [],
                |row| row.get::<_, i64>(0),
            );
            match count_result {
                Ok(count) => Ok(count.max(0) as u64),
                Err(err) => {
                    error!("[backup] Could not count catalog files: {err:?}");
                    Err(BackupError::Corrupt)
                }
            }
        })
    }
}

/// Open `Manifest.db` and verify the `Files` table
fn open_catalog(root: &Path) -> Result<Connection, BackupError> {
    let conn = match open_sqlite(&root.join("Manifest.db")) {
        Ok(result) => result,
        Err(err) => {
            error!("[backup] Could not open Manifest.db: {err:?}");
            return Err(BackupError::Corrupt);
        }
    };

    let columns = table_columns(&conn, "Files");
    for required in ["fileID", "domain", "relativePath", "flags"] {
        if !columns.contains(required) {
            error!("[backup] Manifest.db Files table is missing {required}");
            return Err(BackupError::Corrupt);
        }
    }
    Ok(conn)
}

/// Compute the `fileID` of a logical file: `hex(SHA1(domain-relativePath))`
pub fn file_id(domain: &str, relative_path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(domain.as_bytes());
    hasher.update(b"-");
    hasher.update(relative_path.as_bytes());
    hex_string(&hasher.finalize(), "")
}
