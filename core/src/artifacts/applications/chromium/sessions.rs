/**
 * Chrome for iOS keeps its SNSS session files (`Session_*`, `Tabs_*`, `Current Session`, `Last Session`)
 * inside the app container. They are found by keyword and every file is carved independently
 */
use super::{error::ChromiumError, snss::parse_snss};
use crate::{artifacts::ios::backup::manifest::BackupIndex, filesystem::files::read_file};
use common::{applications::ChromeSession, ios::FileEntry};
use log::{error, warn};
use std::collections::BTreeSet;

const CHROME_DOMAIN: &str = "AppDomain-com.google.chrome.ios";
const SESSION_KEYWORDS: [&str; 2] = ["Session", "Tabs"];

/// Catalog entries that look like Chrome session files
fn session_files(index: &BackupIndex) -> Result<Vec<FileEntry>, ChromiumError> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    for keyword in SESSION_KEYWORDS {
        let entries = match index.find_by_keyword(keyword, None) {
            Ok(result) => result,
            Err(err) => {
                error!("[chromium] Could not search catalog for {keyword}: {err:?}");
                return Err(ChromiumError::Catalog);
            }
        };
        for entry in entries {
            if entry.domain != CHROME_DOMAIN || entry.flags != 1 {
                continue;
            }
            if seen.insert(entry.file_id.clone()) {
                files.push(entry);
            }
        }
    }
    Ok(files)
}

/// Carve every Chrome session file in the backup
pub fn chrome_sessions(index: &BackupIndex) -> Result<Vec<ChromeSession>, ChromiumError> {
    let files = session_files(index)?;
    if files.is_empty() {
        warn!("[chromium] No Chrome session files in backup");
        return Err(ChromiumError::ArtifactAbsent);
    }

    let mut sessions = Vec::new();
    for entry in files {
        let path = match index.resolve_file_id(&entry.file_id) {
            Ok(result) => result,
            Err(err) => {
                warn!("[chromium] Session blob {} missing: {err:?}", entry.file_id);
                continue;
            }
        };
        let data = match read_file(&path) {
            Ok(result) => result,
            Err(err) => {
                warn!("[chromium] Could not read session {}: {err:?}", entry.relative_path);
                continue;
            }
        };
        let records = match parse_snss(&data) {
            Ok(result) => result,
            Err(err) => {
                error!("[chromium] Could not carve session {}: {err:?}", entry.relative_path);
                return Err(err);
            }
        };
        sessions.push(ChromeSession {
            relative_path: entry.relative_path,
            file_id: entry.file_id,
            records,
        });
    }
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::{chrome_sessions, CHROME_DOMAIN};
    use crate::utils::testing::TestBackup;

    #[test]
    fn test_chrome_sessions() {
        let mut backup = TestBackup::new();
        let mut data = vec![0; 16];
        data.extend_from_slice(b"https://news.example.kr/article\x00");
        backup.add_file(CHROME_DOMAIN, "Library/Application Support/Chromium/Default/Sessions/Session_13354965", &data);
        backup.add_file(CHROME_DOMAIN, "Library/Application Support/Chromium/Default/Sessions/Tabs_13354965", b"nothing here");
        backup.add_file("AppDomain-com.other.app", "Library/Session_1", b"https://ignored.example");
        backup.add_directory(CHROME_DOMAIN, "Library/Application Support/Chromium/Default/Sessions");
        let index = backup.open();

        let sessions = chrome_sessions(&index).unwrap();
        assert_eq!(sessions.len(), 2);
        let session = sessions
            .iter()
            .find(|session| session.relative_path.ends_with("Session_13354965"))
            .unwrap();
        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].url, "https://news.example.kr/article");
        assert!(sessions.iter().all(|session| session.file_id.len() == 40));
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_no_sessions() {
        let backup = TestBackup::new();
        let index = backup.open();
        chrome_sessions(&index).unwrap();
    }
}
