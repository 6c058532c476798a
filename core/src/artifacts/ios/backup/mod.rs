pub(crate) mod error;
pub(crate) mod filter;
pub(crate) mod manifest;
pub(crate) mod metadata;
pub(crate) mod tree;
