pub(crate) mod accounts;
pub(crate) mod apps;
pub(crate) mod bluetooth;
pub(crate) mod database;
pub(crate) mod device;
pub(crate) mod error;
pub(crate) mod subscriber;
pub(crate) mod wifi;
