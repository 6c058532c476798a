use std::fmt;

#[derive(Debug)]
pub(crate) enum LocalError {
    CreateDirectory,
    OpenFile,
    WriteData,
}

impl std::error::Error for LocalError {}

impl fmt::Display for LocalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalError::CreateDirectory => write!(f, "Failed to create case output directory"),
            LocalError::OpenFile => write!(f, "Failed to open artifact output file"),
            LocalError::WriteData => write!(f, "Failed to write artifact data"),
        }
    }
}
