use std::fmt;

#[derive(Debug)]
pub enum LineError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
    Catalog,
}

impl std::error::Error for LineError {}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::ArtifactAbsent => write!(f, "LINE database not found in backup"),
            LineError::SqliteParse => write!(f, "Failed to open LINE database"),
            LineError::BadSQL => write!(f, "Failed to compose LINE SQL query"),
            LineError::SchemaDrift => write!(f, "LINE database is missing the ZCHAT or ZMESSAGE tables"),
            LineError::Catalog => write!(f, "Failed to query backup catalog for LINE"),
        }
    }
}
