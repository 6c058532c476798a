use std::fmt;

#[derive(Debug)]
pub enum ChromiumError {
    ArtifactAbsent,
    Catalog,
    Regex,
}

impl std::error::Error for ChromiumError {}

impl fmt::Display for ChromiumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChromiumError::ArtifactAbsent => write!(f, "No Chrome session files found in backup"),
            ChromiumError::Catalog => write!(f, "Failed to query backup catalog for Chrome sessions"),
            ChromiumError::Regex => write!(f, "Could not compile session URL pattern"),
        }
    }
}
