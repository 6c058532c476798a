pub(crate) mod archiver;
pub(crate) mod error;
pub(crate) mod property_list;
