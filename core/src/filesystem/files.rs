use super::error::FileSystemError;
use log::error;
use std::{
    fs::{read, File},
    io::Read,
    path::Path,
};

/// Check if path is a regular file
pub(crate) fn is_file(path: &Path) -> bool {
    path.is_file()
}

/// Read a whole file into memory
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, FileSystemError> {
    if !is_file(path) {
        return Err(FileSystemError::NotFile);
    }

    let read_result = read(path);
    match read_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[files] Could not read file {}: {err:?}", path.display());
            Err(FileSystemError::ReadFile)
        }
    }
}

/// Read the first `size` bytes of a file
pub(crate) fn read_header(path: &Path, size: usize) -> Result<Vec<u8>, FileSystemError> {
    let file_result = File::open(path);
    let mut file = match file_result {
        Ok(result) => result,
        Err(err) => {
            error!("[files] Could not open file {}: {err:?}", path.display());
            return Err(FileSystemError::OpenFile);
        }
    };

    let mut buffer = vec![0; size];
    let read_result = file.read_exact(&mut buffer);
    match read_result {
        Ok(_) => Ok(buffer),
        Err(_err) => Err(FileSystemError::ShortFile),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_file, read_file, read_header};

    #[test]
    fn test_read_file_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.bin");
        std::fs::write(&path, b"SQLite format 3\0rest").unwrap();

        assert!(is_file(&path));
        assert_eq!(read_file(&path).unwrap().len(), 20);
        assert_eq!(read_header(&path, 16).unwrap(), b"SQLite format 3\0");
        assert!(read_header(&path, 64).is_err());
    }

    #[test]
    #[should_panic(expected = "NotFile")]
    fn test_read_directory() {
        let dir = tempfile::tempdir().unwrap();
        read_file(dir.path()).unwrap();
    }
}
