use std::fmt;

#[derive(Debug)]
pub enum InstagramError {
    ArtifactAbsent,
    Plist,
    Catalog,
}

impl std::error::Error for InstagramError {}

impl fmt::Display for InstagramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstagramError::ArtifactAbsent => write!(f, "Instagram artifact not found in backup"),
            InstagramError::Plist => write!(f, "Could not parse Instagram plist"),
            InstagramError::Catalog => write!(f, "Failed to query backup catalog for Instagram"),
        }
    }
}
