use std::fmt;

#[derive(Debug)]
pub enum FormatError {
    Serialize,
    Write,
}

impl std::error::Error for FormatError {}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Serialize => write!(f, "Could not serialize artifact envelope"),
            FormatError::Write => write!(f, "Could not write formatted artifact"),
        }
    }
}
