use std::fmt;

#[derive(Debug)]
pub enum PlistError {
    Dictionary,
    String,
    Array,
    File,
    Bool,
    NotArchive,
    BadUid,
}

impl std::error::Error for PlistError {}

impl fmt::Display for PlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlistError::Dictionary => write!(f, "Not a plist dictionary value"),
            PlistError::String => write!(f, "Not a plist string value"),
            PlistError::Array => write!(f, "Not a plist array value"),
            PlistError::File => write!(f, "Could not read plist file"),
            PlistError::Bool => write!(f, "Not a plist bool value"),
            PlistError::NotArchive => write!(f, "Not a keyed archive plist"),
            PlistError::BadUid => write!(f, "Keyed archive UID outside of $objects"),
        }
    }
}
