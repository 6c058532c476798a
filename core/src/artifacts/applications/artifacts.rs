use crate::{
    artifacts::{error::CollectionError, ios::backup::manifest::BackupIndex, output::output_data},
    structs::toml::Output,
    utils::time,
};

/// Parse Safari history, optionally filtered by URL or title
pub(crate) fn safari_history(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::safari::history::safari_history;

    let start_time = time::time_now();
    let results = safari_history(index, query);
    output_data(results, "safari_history", output, index.metadata(), start_time)
}

/// Parse Safari bookmarks
pub(crate) fn safari_bookmarks(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::safari::bookmarks::safari_bookmarks;

    let start_time = time::time_now();
    let results = safari_bookmarks(index);
    output_data(results, "safari_bookmarks", output, index.metadata(), start_time)
}

/// List cached Safari tab thumbnails
pub(crate) fn safari_thumbnails(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::safari::thumbnails::safari_thumbnails;

    let start_time = time::time_now();
    let results = safari_thumbnails(index);
    output_data(results, "safari_thumbnails", output, index.metadata(), start_time)
}

/// Scavenge Chrome for iOS session files
pub(crate) fn chrome_sessions(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::chromium::sessions::chrome_sessions;

    let start_time = time::time_now();
    let results = chrome_sessions(index);
    output_data(results, "chrome_sessions", output, index.metadata(), start_time)
}

/// Parse KakaoTalk chats and messages
pub(crate) fn kakaotalk(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::kakaotalk::chats::kakaotalk_all_chats;

    let start_time = time::time_now();
    let results = kakaotalk_all_chats(index, query);
    output_data(results, "kakaotalk", output, index.metadata(), start_time)
}

/// Parse LINE chats and messages
pub(crate) fn line(
    index: &BackupIndex,
    output: &Output,
    query: Option<&str>,
) -> Result<(), CollectionError> {
    use super::line::talk::line_all_chats;

    let start_time = time::time_now();
    let results = line_all_chats(index, query);
    output_data(results, "line", output, index.metadata(), start_time)
}

/// Parse the logged in Instagram account
pub(crate) fn instagram_account(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::instagram::account::instagram_account;

    let start_time = time::time_now();
    let results = instagram_account(index);
    output_data(results, "instagram_account", output, index.metadata(), start_time)
}

/// Parse Instagram direct messages
pub(crate) fn instagram_direct(index: &BackupIndex, output: &Output) -> Result<(), CollectionError> {
    use super::instagram::direct::instagram_direct;

    let start_time = time::time_now();
    let results = instagram_direct(index);
    output_data(results, "instagram_direct", output, index.metadata(), start_time)
}

/// Parse accounts followed on Instagram
pub(crate) fn instagram_following(
    index: &BackupIndex,
    output: &Output,
) -> Result<(), CollectionError> {
    use super::instagram::following::instagram_following;

    let start_time = time::time_now();
    let results = instagram_following(index);
    output_data(results, "instagram_following", output, index.metadata(), start_time)
}

#[cfg(test)]
mod tests {
    use super::{line, safari_bookmarks};
    use crate::{structs::toml::Output, utils::testing::TestBackup};
    use std::fs::read_to_string;

    fn output_options(directory: &str) -> Output {
        Output {
            name: String::from("applications"),
            directory: directory.to_string(),
            format: String::from("jsonl"),
            compress: false,
            logging: None,
        }
    }

    #[test]
    fn test_missing_line_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string());
        let backup = TestBackup::new();
        let index = backup.open();

        assert!(line(&index, &output, None).is_err());
        let status = read_to_string(dir.path().join("applications/status.log")).unwrap();
        assert!(status.starts_with("line:"));
    }

    #[test]
    #[should_panic(expected = "Artifact")]
    fn test_missing_bookmarks() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string());
        let backup = TestBackup::new();
        let index = backup.open();
        safari_bookmarks(&index, &output).unwrap();
    }
}
