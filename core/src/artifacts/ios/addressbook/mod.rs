pub(crate) mod contacts;
pub(crate) mod error;
pub(crate) mod lookup;
pub(crate) mod phone;
