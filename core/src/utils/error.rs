use std::fmt;

#[derive(Debug)]
pub enum OrchardError {
    BadToml,
    CreateDirectory,
    LogFile,
    Local,
    Compress,
}

impl std::error::Error for OrchardError {}

impl fmt::Display for OrchardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchardError::BadToml => write!(f, "Failed to parse TOML data"),
            OrchardError::CreateDirectory => write!(f, "Could not create directory(ies)"),
            OrchardError::LogFile => write!(f, "Could not create log file"),
            OrchardError::Local => write!(f, "Failed output data to local directory"),
            OrchardError::Compress => write!(f, "Failed to compress output data"),
        }
    }
}
