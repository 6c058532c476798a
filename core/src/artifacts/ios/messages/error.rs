use std::fmt;

#[derive(Debug)]
pub enum MessagesError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
}

impl std::error::Error for MessagesError {}

impl fmt::Display for MessagesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagesError::ArtifactAbsent => write!(f, "sms.db not found in backup"),
            MessagesError::SqliteParse => write!(f, "Failed to open sms.db"),
            MessagesError::BadSQL => write!(f, "Failed to compose sms.db SQL query"),
            MessagesError::SchemaDrift => write!(f, "sms.db is missing the chat or message tables"),
        }
    }
}
