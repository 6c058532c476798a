pub(crate) mod error;
pub(crate) mod sessions;
pub(crate) mod snss;
