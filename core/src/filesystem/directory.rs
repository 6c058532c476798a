use log::warn;
use std::path::Path;
use walkdir::WalkDir;

/// Check if path is a directory
pub(crate) fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Sum the sizes of all regular files under a directory. Symlinks are not followed
pub(crate) fn directory_size(path: &Path) -> u64 {
    let mut size = 0;
    if !is_directory(path) {
        return size;
    }
    for entry_result in WalkDir::new(path).same_file_system(true) {
        let entry = match entry_result {
            Ok(result) => result,
            Err(err) => {
                warn!("[files] Could not walk {}: {err:?}", path.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => size += meta.len(),
            Err(err) => warn!("[files] Could not get metadata for {}: {err:?}", entry.path().display()),
        }
    }
    size
}
