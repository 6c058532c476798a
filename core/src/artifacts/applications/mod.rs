pub(crate) mod artifacts;
pub(crate) mod chromium;
pub(crate) mod instagram;
pub(crate) mod kakaotalk;
pub(crate) mod line;
pub(crate) mod safari;
