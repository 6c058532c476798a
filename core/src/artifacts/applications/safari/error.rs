use std::fmt;

#[derive(Debug)]
pub enum SafariError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    Catalog,
}

impl std::error::Error for SafariError {}

impl fmt::Display for SafariError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafariError::ArtifactAbsent => write!(f, "Safari database not found in backup"),
            SafariError::SqliteParse => write!(f, "Failed to parse Safari sqlite file"),
            SafariError::BadSQL => write!(f, "Could not compose sqlite query"),
            SafariError::Catalog => write!(f, "Failed to query backup catalog for Safari files"),
        }
    }
}
