use std::fmt;

#[derive(Debug)]
pub enum CallHistoryError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
}

impl std::error::Error for CallHistoryError {}

impl fmt::Display for CallHistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallHistoryError::ArtifactAbsent => {
                write!(f, "Call history database or ZCALLRECORD table not found")
            }
            CallHistoryError::SqliteParse => write!(f, "Failed to open call history database"),
            CallHistoryError::BadSQL => write!(f, "Failed to compose call history SQL query"),
        }
    }
}
