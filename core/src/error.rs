use std::fmt;

#[derive(Debug)]
pub enum TomlError {
    NoFile,
    BadToml,
    BadBackup,
}

impl std::error::Error for TomlError {}

impl fmt::Display for TomlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TomlError::NoFile => write!(f, "Failed to read TOML file"),
            TomlError::BadToml => write!(f, "Failed to parse TOML data"),
            TomlError::BadBackup => write!(f, "Failed to open the backup"),
        }
    }
}
