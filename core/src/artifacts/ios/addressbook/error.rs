use std::fmt;

#[derive(Debug)]
pub enum AddressBookError {
    ArtifactAbsent,
    SqliteParse,
    BadSQL,
    SchemaDrift,
}

impl std::error::Error for AddressBookError {}

impl fmt::Display for AddressBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressBookError::ArtifactAbsent => write!(f, "AddressBook database not found in backup"),
            AddressBookError::SqliteParse => write!(f, "Failed to open AddressBook database"),
            AddressBookError::BadSQL => write!(f, "Failed to compose AddressBook SQL query"),
            AddressBookError::SchemaDrift => write!(f, "AddressBook database has no ABPerson table"),
        }
    }
}
