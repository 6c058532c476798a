pub(crate) mod chats;
pub(crate) mod error;
