use std::fmt;

#[derive(Debug)]
pub enum CalendarError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
    BadWindow,
}

impl std::error::Error for CalendarError {}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::ArtifactAbsent => write!(f, "Calendar database not found in backup"),
            CalendarError::SqliteParse => write!(f, "Failed to open Calendar database"),
            CalendarError::BadSQL => write!(f, "Failed to compose Calendar SQL query"),
            CalendarError::SchemaDrift => write!(f, "Calendar database has no CalendarItem table"),
            CalendarError::BadWindow => write!(f, "Invalid calendar date window"),
        }
    }
}
