pub(crate) mod body;
pub(crate) mod error;
pub(crate) mod notes;
