use std::fmt;

#[derive(Debug)]
pub enum SystemError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
    Plist,
    Catalog,
}

impl std::error::Error for SystemError {}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::ArtifactAbsent => write!(f, "System artifact not found in backup"),
            SystemError::SqliteParse => write!(f, "Failed to open system database"),
            SystemError::BadSQL => write!(f, "Failed to compose system database SQL query"),
            SystemError::SchemaDrift => write!(f, "System database is missing its expected table"),
            SystemError::Plist => write!(f, "Failed to parse system plist"),
            SystemError::Catalog => write!(f, "Failed to query backup catalog"),
        }
    }
}
