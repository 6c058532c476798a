pub(crate) mod error;
pub(crate) mod handle;
pub(crate) mod records;
pub(crate) mod recents;
pub(crate) mod storedata;
