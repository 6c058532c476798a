use std::fmt;

#[derive(Debug)]
pub enum NotesError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
    NoteMissing,
}

impl std::error::Error for NotesError {}

impl fmt::Display for NotesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotesError::ArtifactAbsent => write!(f, "NoteStore.sqlite not found in backup"),
            NotesError::SqliteParse => write!(f, "Failed to open NoteStore.sqlite"),
            NotesError::BadSQL => write!(f, "Failed to compose NoteStore SQL query"),
            NotesError::SchemaDrift => write!(f, "NoteStore.sqlite has no ZICCLOUDSYNCINGOBJECT table"),
            NotesError::NoteMissing => write!(f, "Note not found"),
        }
    }
}
