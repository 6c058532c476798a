use super::{
    database::{open_table, query_rows},
    error::SystemError,
};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{
        sqlite::{column_projection, value_f64, value_text},
        strings::normalize_nfc,
        time::apple_float_seconds,
    },
};
use common::ios::Account;

/// Get accounts registered on the device from `Accounts3.sqlite`
pub fn accounts(index: &BackupIndex) -> Result<Vec<Account>, SystemError> {
    let (conn, observed) =
        open_table(index, "HomeDomain", "Library/Accounts/Accounts3.sqlite", "ZACCOUNT")?;
    let projection = column_projection(
        &observed,
        &[
            "ZUSERNAME",
            "ZOWNINGBUNDLEID",
            "ZACCOUNTDESCRIPTION",
            "ZIDENTIFIER",
            "ZDATE",
        ],
        "",
    );
    let query = format!("SELECT {projection} FROM ZACCOUNT ORDER BY ZDATE DESC");

    query_rows(&conn, &query, |row| {
        Ok(Account {
            username: normalize_nfc(&value_text(row, "ZUSERNAME")),
            owning_bundle_id: value_text(row, "ZOWNINGBUNDLEID"),
            description: normalize_nfc(&value_text(row, "ZACCOUNTDESCRIPTION")),
            identifier: value_text(row, "ZIDENTIFIER"),
            date: value_f64(row, "ZDATE").and_then(apple_float_seconds),
        })
    })
}
