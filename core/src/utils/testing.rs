/**
 * Builds throwaway backups in a temporary directory.
 * Blobs are written to `<root>/<id[0:2]>/<id>` and registered in a freshly written `Manifest.db`
 */
use crate::artifacts::ios::backup::manifest::{file_id, BackupIndex};
use common::ios::FileEntry;
use plist::{Dictionary, Value};
use rusqlite::Connection;
use std::{
    fs::{create_dir_all, remove_file, write},
    path::{Path, PathBuf},
    time::{Duration, UNIX_EPOCH},
};
use tempfile::TempDir;

pub(crate) struct TestBackup {
    dir: TempDir,
    entries: Vec<FileEntry>,
}

impl TestBackup {
    pub(crate) fn new() -> TestBackup {
        let backup = TestBackup {
            dir: tempfile::tempdir().unwrap(),
            entries: Vec::new(),
        };
        backup.write_plist("Manifest.plist", &manifest_plist());
        backup.write_catalog();
        backup
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path where the blob of a `fileID` is stored
    pub(crate) fn blob_path(&self, id: &str) -> PathBuf {
        self.root().join(&id[0..2]).join(id)
    }

    /// Write a blob without a catalog row
    pub(crate) fn add_blob(&self, id: &str, data: &[u8]) -> PathBuf {
        let path = self.blob_path(id);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(&path, data).unwrap();
        path
    }

    fn register(&mut self, domain: &str, relative_path: &str, flags: i64) -> String {
        let id = file_id(domain, relative_path);
        self.entries.push(FileEntry {
            file_id: id.clone(),
            domain: domain.to_string(),
            relative_path: relative_path.to_string(),
            flags,
        });
        id
    }

    pub(crate) fn add_file(&mut self, domain: &str, relative_path: &str, data: &[u8]) -> PathBuf {
        let id = self.register(domain, relative_path, 1);
        self.add_blob(&id, data)
    }

    pub(crate) fn add_directory(&mut self, domain: &str, relative_path: &str) {
        self.register(domain, relative_path, 2);
    }

    /// Create a SQLITE blob from a SQL script and register it
    pub(crate) fn add_sqlite(&mut self, domain: &str, relative_path: &str, sql: &str) -> PathBuf {
        let id = self.register(domain, relative_path, 1);
        self.sqlite_blob(&id, sql)
    }

    /// Create a SQLITE blob from a SQL script without a catalog row
    pub(crate) fn sqlite_blob(&self, id: &str, sql: &str) -> PathBuf {
        let path = self.blob_path(id);
        create_dir_all(path.parent().unwrap()).unwrap();
        let _ = remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        path
    }

    /// Write a binary `plist` blob and register it
    pub(crate) fn add_plist(&mut self, domain: &str, relative_path: &str, value: &Value) -> PathBuf {
        let mut buffer = Vec::new();
        value.to_writer_binary(&mut buffer).unwrap();
        self.add_file(domain, relative_path, &buffer)
    }

    /// Write a binary `plist` directly under the backup root
    pub(crate) fn write_plist(&self, name: &str, value: &Value) {
        value.to_file_binary(self.root().join(name)).unwrap();
    }

    /// Rebuild `Manifest.db` from the registered entries
    pub(crate) fn write_catalog(&self) {
        let path = self.root().join("Manifest.db");
        let _ = remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Files (fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB);
             CREATE INDEX FilesDomainIdx ON Files(domain);
             CREATE INDEX FilesRelativePathIdx ON Files(relativePath);
             CREATE TABLE Properties (key TEXT PRIMARY KEY, value BLOB);",
        )
        .unwrap();
        for entry in &self.entries {
            conn.execute(
                "INSERT OR REPLACE INTO Files (fileID, domain, relativePath, flags) VALUES (?1, ?2, ?3, ?4)",
                (&entry.file_id, &entry.domain, &entry.relative_path, entry.flags),
            )
            .unwrap();
        }
    }

    /// Write the catalog and open the backup
    pub(crate) fn open(&self) -> BackupIndex {
        self.write_catalog();
        BackupIndex::open(self.root()).unwrap()
    }
}

pub(crate) fn dict(entries: Vec<(&str, Value)>) -> Value {
    let mut dict = Dictionary::new();
    for (key, value) in entries {
        dict.insert(key.to_string(), value);
    }
    Value::Dictionary(dict)
}

pub(crate) fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

fn manifest_plist() -> Value {
    let lockdown = dict(vec![
        ("DeviceName", string("Test iPhone")),
        ("ProductType", string("iPhone14,2")),
        ("ProductVersion", string("17.4.1")),
        ("BuildVersion", string("21E236")),
        ("SerialNumber", string("F2LXK0ABCD12")),
        ("UniqueDeviceID", string("00008030-001A2B3C4D5E6F70")),
    ]);
    let date = UNIX_EPOCH + Duration::from_secs(1717200000);
    dict(vec![
        ("IsEncrypted", Value::Boolean(false)),
        ("Version", string("10.0")),
        ("Date", Value::Date(date.into())),
        ("SystemDomainsVersion", string("24.0")),
        ("WasPasscodeSet", Value::Boolean(true)),
        ("Lockdown", lockdown),
    ])
}
