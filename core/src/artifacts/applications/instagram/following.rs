/**
 * Parse the accounts the user follows from `user_bootstrap/shared_bootstraps.plist`
 * The file is an NSKeyedArchiver archive with `$top.root -> users`.
 * Key names changed between app versions so every field has a list of fallbacks.
 * If the structured walk finds nothing every user-like dictionary in `$objects` is used instead
 */
use super::error::InstagramError;
use crate::{
    artifacts::ios::{
        backup::manifest::BackupIndex,
        plist::archiver::{ArchiveObject, KeyedArchive},
    },
    filesystem::files::read_file,
    utils::strings::{contains_insensitive, normalize_nfc},
};
use common::applications::InstagramFollowing;
use log::{error, warn};
use std::collections::BTreeSet;

const BOOTSTRAP_PATH: &str = "user_bootstrap/shared_bootstraps.plist";
const INSTAGRAM_APP: &str = "instagram";

const USER_ID_KEYS: [&str; 4] = ["user_id", "userId", "id", "pk"];
const USERNAME_KEYS: [&str; 4] = ["username", "user_name", "userName", "login"];
const FULL_NAME_KEYS: [&str; 5] = ["fullname", "full_name", "fullName", "name", "display_name"];
const PROFILE_KEYS: [&str; 5] = ["profile_url", "profileUrl", "profile_pic_url", "profilePicUrl", "profile_pic"];
const FOLLOWED_BY_KEYS: [&str; 4] = ["followed_by", "followedBy", "is_followed_by", "isFollowedBy"];
const EXTRA_ATTRIBUTES: &str = "extra_attributes";

/// Get the followed accounts cached by Instagram
pub fn instagram_following(index: &BackupIndex) -> Result<Vec<InstagramFollowing>, InstagramError> {
    let entries = match index.find_by_keyword(BOOTSTRAP_PATH, None) {
        Ok(result) => result,
        Err(err) => {
            error!("[instagram] Could not search catalog for shared_bootstraps.plist: {err:?}");
            return Err(InstagramError::Catalog);
        }
    };
    let path = match entries
        .iter()
        .filter(|entry| entry.flags == 1 && contains_insensitive(&entry.domain, INSTAGRAM_APP))
        .find_map(|entry| index.resolve_file_id(&entry.file_id).ok())
    {
        Some(result) => result,
        None => {
            warn!("[instagram] shared_bootstraps.plist not found");
            return Err(InstagramError::ArtifactAbsent);
        }
    };
    let data = match read_file(&path) {
        Ok(result) => result,
        Err(err) => {
            error!("[instagram] Could not read shared_bootstraps.plist: {err:?}");
            return Err(InstagramError::Plist);
        }
    };
    let archive = match KeyedArchive::parse(&data) {
        Ok(result) => result,
        Err(err) => {
            error!("[instagram] shared_bootstraps.plist is not a keyed archive: {err:?}");
            return Err(InstagramError::Plist);
        }
    };

    let users = structured_users(&archive);
    if !users.is_empty() {
        return Ok(users);
    }
    warn!("[instagram] No users under $top.root, scanning every archived object");
    Ok(scan_users(&archive))
}

/// Walk `$top.root -> users`
pub(crate) fn structured_users(archive: &KeyedArchive) -> Vec<InstagramFollowing> {
    let root = match archive.top("root") {
        Some(result) => result,
        None => return Vec::new(),
    };
    let users = match archive.dict_get(root, "users") {
        Some(result) => result,
        None => return Vec::new(),
    };
    archive
        .array_items(users)
        .into_iter()
        .map(|user| user_fields(archive, user))
        .filter(|user| !user.user_id.is_empty() || !user.username.is_empty())
        .collect()
}

/// Treat every dictionary with a username, an id and a name or picture as a user
pub(crate) fn scan_users(archive: &KeyedArchive) -> Vec<InstagramFollowing> {
    let mut seen = BTreeSet::new();
    let mut users = Vec::new();
    for object in archive.objects().iter().filter(|object| object.is_dict()) {
        let fields = archive.flatten(object);
        let has_any = |keys: &[&str]| keys.iter().any(|key| fields.contains_key(*key));
        let has_details = has_any(&FULL_NAME_KEYS) || has_any(&PROFILE_KEYS);
        if !(has_any(&USERNAME_KEYS[..3]) && has_any(&USER_ID_KEYS) && has_details) {
            continue;
        }
        let user = user_fields(archive, object);
        if seen.insert((user.user_id.clone(), user.username.clone())) {
            users.push(user);
        }
    }
    users
}

fn user_fields(archive: &KeyedArchive, user: &ArchiveObject) -> InstagramFollowing {
    let fields = archive.flatten(user);
    let extra = fields
        .get(EXTRA_ATTRIBUTES)
        .map(|attributes| archive.flatten(attributes))
        .unwrap_or_default();

    let text = |keys: &[&str]| -> String {
        for source in [&fields, &extra] {
            for key in keys {
                if let Some(value) = source.get(*key).and_then(|object| render(archive, object)) {
                    return value;
                }
            }
        }
        String::new()
    };
    let followed_by = [&fields, &extra].iter().find_map(|source| {
        FOLLOWED_BY_KEYS
            .iter()
            .find_map(|key| source.get(*key).and_then(|object| object.as_bool()))
    });

    InstagramFollowing {
        user_id: text(&USER_ID_KEYS),
        username: text(&USERNAME_KEYS),
        full_name: text(&FULL_NAME_KEYS),
        profile_url: text(&PROFILE_KEYS),
        followed_by,
    }
}

fn render(archive: &KeyedArchive, object: &ArchiveObject) -> Option<String> {
    let value = archive
        .string(object)
        .or_else(|| object.render())
        .or_else(|| archive.dict_get(object, "NS.relative").and_then(|url| archive.string(url)))?;
    let value = normalize_nfc(&value);
    if value.is_empty() {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::{instagram_following, scan_users, structured_users, BOOTSTRAP_PATH};
    use crate::{
        artifacts::ios::plist::archiver::{
            tests::{build_archive, dict, uid},
            KeyedArchive,
        },
        utils::testing::TestBackup,
    };
    use plist::Value;

    fn text(value: &str) -> Value {
        Value::String(value.to_string())
    }

    fn bootstrap_objects() -> Vec<Value> {
        vec![
            text("$null"),
            dict(vec![("users", uid(2))]),
            dict(vec![("NS.objects", Value::Array(vec![uid(3), uid(5)]))]),
            dict(vec![
                ("pk", Value::Integer(2222.into())),
                ("username", text("hangang.runner")),
                ("full_name", text("\u{1100}\u{1175}\u{11b7}")),
                ("extra_attributes", uid(4)),
            ]),
            dict(vec![
                ("profile_pic_url", text("https://cdn.example/2222.jpg")),
                ("is_followed_by", Value::Boolean(true)),
            ]),
            dict(vec![
                ("NS.keys", Value::Array(vec![uid(6), uid(7)])),
                ("NS.objects", Value::Array(vec![uid(8), uid(9)])),
            ]),
            text("userId"),
            text("userName"),
            text("3333"),
            text("busan_food"),
        ]
    }

    #[test]
    fn test_structured_users() {
        let archive = KeyedArchive::parse(&build_archive(bootstrap_objects(), 1)).unwrap();
        let users = structured_users(&archive);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "2222");
        assert_eq!(users[0].username, "hangang.runner");
        assert_eq!(users[0].full_name, "김");
        assert_eq!(users[0].profile_url, "https://cdn.example/2222.jpg");
        assert_eq!(users[0].followed_by, Some(true));
        assert_eq!(users[1].user_id, "3333");
        assert_eq!(users[1].username, "busan_food");
        assert_eq!(users[1].followed_by, None);
    }

    #[test]
    fn test_scan_users() {
        let objects = vec![
            text("$null"),
            dict(vec![("unrelated", uid(2))]),
            dict(vec![
                ("id", text("4444")),
                ("user_name", text("jeju.trip")),
                ("name", text("Jeju")),
            ]),
            dict(vec![("id", text("5555")), ("user_name", text("no_details"))]),
        ];
        let archive = KeyedArchive::parse(&build_archive(objects, 1)).unwrap();
        assert!(structured_users(&archive).is_empty());

        let users = scan_users(&archive);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "jeju.trip");
        assert_eq!(users[0].full_name, "Jeju");
    }

    #[test]
    fn test_instagram_following() {
        let mut backup = TestBackup::new();
        backup.add_file(
            "AppDomain-com.burbn.instagram",
            &format!("Library/Application Support/{BOOTSTRAP_PATH}"),
            &build_archive(bootstrap_objects(), 1),
        );
        let index = backup.open();
        assert_eq!(instagram_following(&index).unwrap().len(), 2);
    }
}
