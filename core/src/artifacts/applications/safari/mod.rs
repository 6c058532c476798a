pub(crate) mod bookmarks;
pub(crate) mod error;
pub(crate) mod history;
pub(crate) mod thumbnails;
