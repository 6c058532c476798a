use std::fmt;

#[derive(Debug)]
pub enum BackupError {
    NotABackup,
    Encrypted,
    Corrupt,
    NotFound,
    BadSQL,
    Poisoned,
}

impl std::error::Error for BackupError {}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::NotABackup => write!(f, "Missing Manifest.plist or Manifest.db"),
            BackupError::Encrypted => write!(f, "Manifest.db is not readable, backup is encrypted"),
            BackupError::Corrupt => write!(f, "Backup catalog is unreadable"),
            BackupError::NotFound => write!(f, "File not found in backup"),
            BackupError::BadSQL => write!(f, "Could not compose catalog SQL query"),
            BackupError::Poisoned => write!(f, "Backup catalog handle lock poisoned"),
        }
    }
}
