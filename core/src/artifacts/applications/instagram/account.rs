/**
 * Parse the Instagram preferences `com.burbn.instagram.plist`
 * Holds the logged in account, last session details, other accounts used on the device and cached auth tokens
 */
use super::error::InstagramError;
use crate::{
    artifacts::ios::{
        backup::manifest::BackupIndex,
        plist::property_list::{get_dictionary, parse_plist_file, value_to_string},
    },
    utils::time::{apple_float_seconds, plist_date_to_datetime, unixepoch_to_datetime},
};
use chrono::{DateTime, Utc};
use common::applications::{InstagramAccount, InstagramAuthToken};
use log::{error, warn};
use plist::{Dictionary, Value};
use std::collections::{BTreeMap, BTreeSet};

const PREFERENCES: [(&str, &str); 2] = [
    ("AppDomain-com.burbn.instagram", "Library/Preferences/com.burbn.instagram.plist"),
    ("AppDomainGroup-group.com.burbn.instagram", "Library/Preferences/group.com.burbn.instagram.plist"),
];

const SESSION_PREFIX: &str = "last_session_";
const BADGE_PREFIX: &str = "account-badges-preferences-";
const AUTH_PREFIX: &str = "authDataStorage:";
const FB_IDS_SUFFIX: &str = "FbIDsKey";

/// Parse the logged in Instagram account
pub fn instagram_account(index: &BackupIndex) -> Result<InstagramAccount, InstagramError> {
    let path = match index.resolve_any(&PREFERENCES) {
        Ok(result) => result,
        Err(err) => {
            warn!("[instagram] Instagram preferences not found: {err:?}");
            return Err(InstagramError::ArtifactAbsent);
        }
    };
    let preferences = match parse_plist_file(&path).and_then(|value| get_dictionary(&value)) {
        Ok(result) => result,
        Err(err) => {
            error!("[instagram] Could not parse Instagram preferences: {err:?}");
            return Err(InstagramError::Plist);
        }
    };
    Ok(parse_account(&preferences))
}

fn parse_account(preferences: &Dictionary) -> InstagramAccount {
    let mut account = InstagramAccount {
        user_id: preferences
            .get("switcherLoggedInUid")
            .map(value_to_string)
            .unwrap_or_default(),
        ..Default::default()
    };

    if let Some(Value::Dictionary(last)) = preferences.get("last-logged-in-account-dict") {
        account.username = last.get("username").map(value_to_string).unwrap_or_default();
        account.profile_picture_url = last
            .get("profilePictureURLString")
            .map(value_to_string)
            .unwrap_or_default();
        if account.user_id.is_empty() {
            account.user_id = last.get("pk").map(value_to_string).unwrap_or_default();
        }
    }

    let mut session = BTreeMap::new();
    let mut related = BTreeSet::new();
    for (key, value) in preferences {
        if key.starts_with(SESSION_PREFIX) {
            session.insert(key.clone(), value_to_string(value));
            if key == "last_session_background_time" {
                account.last_session_background_time = session_time(value);
            }
        } else if let Some(id) = key.strip_prefix(BADGE_PREFIX) {
            related.insert(id.to_string());
        } else if key.ends_with(FB_IDS_SUFFIX) {
            if let Value::Array(ids) = value {
                related.extend(ids.iter().map(value_to_string));
            }
        } else if let Some(id) = key.strip_prefix(AUTH_PREFIX) {
            account.auth_tokens.push(InstagramAuthToken {
                key: key.clone(),
                account_id: id.to_string(),
                current: !account.user_id.is_empty() && id == account.user_id,
                value: value_to_string(value),
            });
        }
    }

    related.retain(|id| !id.is_empty() && id != "0" && *id != account.user_id);
    account.related_accounts = related.into_iter().collect();
    account.session = session;
    account
}

/// Session times are unixepoch seconds. Values below 10^9 are Apple Absolute seconds
fn session_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(plist_date_to_datetime(date)),
        Value::Real(seconds) if *seconds >= 1e9 => unixepoch_to_datetime(*seconds as i64),
        Value::Real(seconds) => apple_float_seconds(*seconds),
        Value::Integer(number) => {
            let seconds = number.as_signed()?;
            if seconds >= 1_000_000_000 {
                unixepoch_to_datetime(seconds)
            } else {
                apple_float_seconds(seconds as f64)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{instagram_account, session_time, PREFERENCES};
    use crate::utils::testing::{dict, string, TestBackup};
    use plist::Value;

    #[test]
    fn test_session_time() {
        assert_eq!(session_time(&Value::Real(1705280400.5)).unwrap().timestamp(), 1705280400);
        assert_eq!(session_time(&Value::Real(726973200.0)).unwrap().timestamp(), 1705280400);
        assert!(session_time(&string("soon")).is_none());
    }

    #[test]
    fn test_instagram_account() {
        let preferences = dict(vec![
            ("switcherLoggedInUid", string("1111")),
            (
                "last-logged-in-account-dict",
                dict(vec![
                    ("username", string("seoul.cafe")),
                    ("profilePictureURLString", string("https://cdn.example/p.jpg")),
                ]),
            ),
            ("last_session_background_time", Value::Real(1705280400.0)),
            ("last_session_app_version", string("315.0")),
            ("last_session_network_type", string("wifi")),
            (
                "switcherFbIDsKey",
                Value::Array(vec![string("2222"), string("0"), string("1111")]),
            ),
            ("account-badges-preferences-3333", dict(vec![])),
            ("authDataStorage:1111", Value::Data(b"token".to_vec())),
            ("authDataStorage:3333", string("other")),
            ("unrelated", string("x")),
        ]);

        let mut backup = TestBackup::new();
        backup.add_plist(PREFERENCES[0].0, PREFERENCES[0].1, &preferences);
        let index = backup.open();

        let account = instagram_account(&index).unwrap();
        assert_eq!(account.user_id, "1111");
        assert_eq!(account.username, "seoul.cafe");
        assert_eq!(account.profile_picture_url, "https://cdn.example/p.jpg");
        assert_eq!(account.last_session_background_time.unwrap().timestamp(), 1705280400);
        assert_eq!(account.session.len(), 3);
        assert_eq!(account.related_accounts, vec!["2222", "3333"]);
        assert_eq!(account.auth_tokens.len(), 2);
        let current: Vec<&str> = account
            .auth_tokens
            .iter()
            .filter(|token| token.current)
            .map(|token| token.account_id.as_str())
            .collect();
        assert_eq!(current, vec!["1111"]);
        assert_eq!(account.auth_tokens[0].value, "dG9rZW4=");
    }

    #[test]
    #[should_panic(expected = "ArtifactAbsent")]
    fn test_missing_preferences() {
        let backup = TestBackup::new();
        let index = backup.open();
        instagram_account(&index).unwrap();
    }
}
