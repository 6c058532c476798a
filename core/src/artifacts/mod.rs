pub(crate) mod applications;
pub(crate) mod collection;
pub(crate) mod error;
pub(crate) mod ios;
pub(crate) mod output;
