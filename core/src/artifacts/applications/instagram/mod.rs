pub(crate) mod account;
pub(crate) mod direct;
pub(crate) mod error;
pub(crate) mod following;
