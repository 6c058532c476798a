pub(crate) mod addressbook;
pub(crate) mod artifacts;
pub(crate) mod backup;
pub(crate) mod calendar;
pub(crate) mod callhistory;
pub(crate) mod messages;
pub(crate) mod notes;
pub(crate) mod plist;
pub(crate) mod system;
