use super::error::SafariError;
use crate::artifacts::ios::backup::{filter::EntryFilter, manifest::BackupIndex};
use common::applications::SafariThumbnail;
use log::{error, warn};

/// Get Safari tab thumbnails resolved to their blob paths
pub fn safari_thumbnails(index: &BackupIndex) -> Result<Vec<SafariThumbnail>, SafariError> {
    let filter = EntryFilter::new()
        .path_like("Library/Safari/Thumbnails/%")
        .files_only();
    let entries = match index.entries(&filter) {
        Ok(result) => result,
        Err(err) => {
            error!("[safari] Could not list Safari thumbnails: {err:?}");
            return Err(SafariError::Catalog);
        }
    };

    let mut thumbnails = Vec::new();
    for entry in entries {
        match index.resolve_file_id(&entry.file_id) {
            Ok(path) => thumbnails.push(SafariThumbnail {
                relative_path: entry.relative_path,
                file_id: entry.file_id,
                path: path.display().to_string(),
            }),
            Err(err) => warn!(
                "[safari] Thumbnail {} has no blob: {err:?}",
                entry.relative_path
            ),
        }
    }
    Ok(thumbnails)
}
