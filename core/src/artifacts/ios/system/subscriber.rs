use super::{
    database::{open_table, query_rows},
    error::SystemError,
};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, value_f64, value_text},
        time::apple_float_seconds,
    },
};
use common::ios::Subscriber;

/// Get subscriber phone numbers (MDN) from `CellularUsage.db`
pub fn subscribers(index: &BackupIndex) -> Result<Vec<Subscriber>, SystemError> {
    let (conn, observed) = open_table(
        index,
        "WirelessDomain",
        "Library/Databases/CellularUsage.db",
        "subscriber_info",
    )?;
    let projection = column_projection(&observed, &["subscriber_mdn", "last_update_time"], "");
    let query = format!("SELECT {projection} FROM subscriber_info ORDER BY last_update_time DESC");

    query_rows(&conn, &query, |row| {
        Ok(Subscriber {
            mdn: value_text(row, "subscriber_mdn"),
            last_update: value_f64(row, "last_update_time").and_then(apple_float_seconds),
        })
    })
}
