#![allow(dead_code)]
/**
 * Writes small iOS backups for the integration tests.
 * Every file is stored at `<root>/<id[0:2]>/<id>` and listed in `Manifest.db`
 */
use plist::{Dictionary, Value};
use rusqlite::Connection;
use sha1::{Digest, Sha1};
use std::{
    fs::{create_dir_all, remove_file, write},
    path::{Path, PathBuf},
};
use tempfile::TempDir;

pub struct Fixture {
    dir: TempDir,
    rows: Vec<(String, String, String, i64)>,
}

impl Fixture {
    pub fn new() -> Fixture {
        let fixture = Fixture {
            dir: tempfile::tempdir().unwrap(),
            rows: Vec::new(),
        };

        let mut lockdown = Dictionary::new();
        lockdown.insert(String::from("DeviceName"), Value::String(String::from("Case iPhone")));
        lockdown.insert(String::from("ProductVersion"), Value::String(String::from("17.4.1")));
        lockdown.insert(
            String::from("UniqueDeviceID"),
            Value::String(String::from("00008030-001A2B3C4D5E6F70")),
        );
        let mut manifest = Dictionary::new();
        manifest.insert(String::from("IsEncrypted"), Value::Boolean(false));
        manifest.insert(String::from("Version"), Value::String(String::from("10.0")));
        manifest.insert(String::from("Lockdown"), Value::Dictionary(lockdown));
        Value::Dictionary(manifest)
            .to_file_binary(fixture.root().join("Manifest.plist"))
            .unwrap();
        fixture.finish();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_id(domain: &str, relative_path: &str) -> String {
        let digest = Sha1::digest(format!("{domain}-{relative_path}").as_bytes());
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.root().join(&id[0..2]).join(id)
    }

    pub fn add_file(&mut self, domain: &str, relative_path: &str, data: &[u8]) -> PathBuf {
        let id = Fixture::file_id(domain, relative_path);
        self.rows
            .push((id.clone(), domain.to_string(), relative_path.to_string(), 1));
        let path = self.blob_path(&id);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(&path, data).unwrap();
        path
    }

    pub fn add_directory(&mut self, domain: &str, relative_path: &str) {
        let id = Fixture::file_id(domain, relative_path);
        self.rows
            .push((id, domain.to_string(), relative_path.to_string(), 2));
    }

    pub fn add_sqlite(&mut self, domain: &str, relative_path: &str, sql: &str) -> PathBuf {
        let path = self.add_file(domain, relative_path, b"");
        remove_file(&path).unwrap();
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        path
    }

    /// Write `Manifest.db` from the added files
    pub fn finish(&self) {
        let path = self.root().join("Manifest.db");
        let _ = remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Files (fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB);
             CREATE TABLE Properties (key TEXT PRIMARY KEY, value BLOB);",
        )
        .unwrap();
        for (id, domain, relative_path, flags) in &self.rows {
            conn.execute(
                "INSERT INTO Files (fileID, domain, relativePath, flags) VALUES (?1, ?2, ?3, ?4)",
                (id, domain, relative_path, flags),
            )
            .unwrap();
        }
    }
}
