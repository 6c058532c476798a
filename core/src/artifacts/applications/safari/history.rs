use super::error::SafariError;
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{open_sqlite, value_f64, value_i64, value_text},
        strings::{contains_insensitive, normalize_nfc},
        time::apple_float_seconds,
    },
};
use common::applications::SafariHistoryEntry;
use log::{error, warn};
use rusqlite::Connection;
use std::path::Path;

pub(crate) const SAFARI_HISTORY: [(&str, &str); 2] = [
    ("HomeDomain", "Library/Safari/History.db"),
    ("AppDomain-com.apple.mobilesafari", "Library/Safari/History.db"),
];

/// Open a Safari database from the first candidate found in the backup
pub(crate) fn open_safari_db(
    index: &BackupIndex,
    candidates: &[(&str, &str)],
) -> Result<Connection, SafariError> {
    let path = match index.resolve_any(candidates) {
        Ok(result) => result,
        Err(err) => {
            warn!("[safari] Safari database not found: {err:?}");
            return Err(SafariError::ArtifactAbsent);
        }
    };
    open_path(&path)
}

fn open_path(path: &Path) -> Result<Connection, SafariError> {
    match open_sqlite(path) {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[safari] Failed to read Safari SQLITE file {err:?}");
            Err(SafariError::SqliteParse)
        }
    }
}

/// Get Safari history visits, most recent first. `visit_time` is Apple Absolute seconds
pub fn safari_history(
    index: &BackupIndex,
    query: Option<&str>,
) -> Result<Vec<SafariHistoryEntry>, SafariError> {
    let conn = open_safari_db(index, &SAFARI_HISTORY)?;
    let statement = conn.prepare(
        "SELECT history_items.id AS history_item_id, url, title, visit_count, visit_time
         FROM history_visits JOIN history_items ON history_visits.history_item = history_items.id
         ORDER BY visit_time DESC",
    );
    let mut stmt = match statement {
        Ok(result) => result,
        Err(err) => {
            error!("[safari] Failed to compose Safari History SQL query {err:?}");
            return Err(SafariError::BadSQL);
        }
    };

    let history_data = stmt.query_map([], |row| {
        Ok(SafariHistoryEntry {
            id: value_i64(row, "history_item_id").unwrap_or_default(),
            url: normalize_nfc(&value_text(row, "url")),
            title: normalize_nfc(&value_text(row, "title")),
            visit_count: value_i64(row, "visit_count").unwrap_or_default(),
            visit_time: value_f64(row, "visit_time").and_then(apple_float_seconds),
        })
    });

    let mut history = Vec::new();
    match history_data {
        Ok(history_iter) => {
            for entry in history_iter {
                match entry {
                    Ok(result) => history.push(result),
                    Err(err) => warn!("[safari] Failed to iterate Safari history data: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[safari] Failed to get Safari history data: {err:?}");
            return Err(SafariError::BadSQL);
        }
    }

    if let Some(needle) = query {
        history.retain(|entry| {
            contains_insensitive(&entry.url, needle) || contains_insensitive(&entry.title, needle)
        });
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::safari_history;
    use crate::utils::testing::TestBackup;

    #[test]
    fn test_safari_history() {
        let mut backup = TestBackup::new();
        backup.add_sqlite(
            "HomeDomain",
            "Library/Safari/History.db",
            "CREATE TABLE history_items (id INTEGER PRIMARY KEY, url TEXT, domain_expansion TEXT, visit_count INTEGER);
             CREATE TABLE history_visits (id INTEGER PRIMARY KEY, history_item INTEGER, visit_time REAL, title TEXT);
             INSERT INTO history_items VALUES (1, 'https://www.naver.com/', 'naver', 3), (2, 'https://example.com/a', NULL, 1);
             INSERT INTO history_visits VALUES
                (1, 1, 726973200.25, 'NAVER'),
                (2, 2, 726980000.0, NULL),
                (3, 1, 726900000.0, 'NAVER');",
        );
        let index = backup.open();

        let history = safari_history(&index, None).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].url, "https://example.com/a");
        assert_eq!(history[0].title, "");
        assert_eq!(history[1].visit_time.unwrap().timestamp(), 1705280400);
        assert_eq!(history[1].visit_count, 3);

        assert_eq!(safari_history(&index, Some("naver")).unwrap().len(), 2);
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_history() {
        let backup = TestBackup::new();
        let index = backup.open();
        safari_history(&index, None).unwrap();
    }
}
