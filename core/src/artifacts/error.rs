use std::fmt;

#[derive(Debug)]
pub(crate) enum CollectionError {
    BadToml,
    Backup,
    Output,
    Format,
    Serialize,
    Artifact,
}

impl std::error::Error for CollectionError {}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::BadToml => write!(f, "Failed to parse collection TOML"),
            CollectionError::Backup => write!(f, "Failed to open backup"),
            CollectionError::Output => write!(f, "Failed to output data"),
            CollectionError::Format => write!(f, "Unknown formatter provided"),
            CollectionError::Serialize => write!(f, "Failed to serialize artifact data"),
            CollectionError::Artifact => write!(f, "Artifact could not be parsed"),
        }
    }
}
