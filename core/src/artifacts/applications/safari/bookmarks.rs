/**
 * Safari bookmarks from `Bookmarks.db`
 * Folders form a tree through `parent`. A recursive query walks down from the root folders
 * and builds the `/` separated folder path of every bookmark
 */
use super::{error::SafariError, history::open_safari_db};
use crate::{
    artifacts::ios::backup::manifest::BackupIndex,
    utils::{sqlite::value_text, strings::normalize_nfc},
};
use common::applications::SafariBookmark;
use log::{error, warn};

const SAFARI_BOOKMARKS: [(&str, &str); 2] = [
    ("HomeDomain", "Library/Safari/Bookmarks.db"),
    ("AppDomain-com.apple.mobilesafari", "Library/Safari/Bookmarks.db"),
];

/// Folder nesting deeper than this is treated as a cycle
const MAX_DEPTH: i64 = 64;

/// Get every bookmark with a URL together with its folder path
pub fn safari_bookmarks(index: &BackupIndex) -> Result<Vec<SafariBookmark>, SafariError> {
    let conn = open_safari_db(index, &SAFARI_BOOKMARKS)?;
    let query = format!(
        "WITH RECURSIVE folders(id, folder_path, depth) AS (
            SELECT id, IFNULL(title, ''), 0 FROM bookmarks
              WHERE type = 1 AND (parent IS NULL OR parent NOT IN (SELECT id FROM bookmarks))
            UNION ALL
            SELECT b.id,
              CASE WHEN f.folder_path = '' THEN IFNULL(b.title, '') ELSE f.folder_path || '/' || IFNULL(b.title, '') END,
              f.depth + 1
            FROM bookmarks b JOIN folders f ON b.parent = f.id
              WHERE b.type = 1 AND b.id != f.id AND f.depth < {MAX_DEPTH}
         )
         SELECT f.folder_path AS folder_path, b.title AS title, b.url AS url
         FROM bookmarks b JOIN folders f ON b.parent = f.id
         WHERE b.url IS NOT NULL AND b.url != '' ORDER BY b.id"
    );

    let mut stmt = match conn.prepare(&query) {
        Ok(result) => result,
        Err(err) => {
            error!("[safari] Failed to compose Safari bookmarks query: {err:?}");
            return Err(SafariError::BadSQL);
        }
    };
    let rows = stmt.query_map([], |row| {
        Ok(SafariBookmark {
            folder_path: normalize_nfc(&value_text(row, "folder_path")),
            title: normalize_nfc(&value_text(row, "title")),
            url: value_text(row, "url"),
        })
    });

    let mut bookmarks = Vec::new();
    match rows {
        Ok(row_iter) => {
            for row in row_iter {
                match row {
                    Ok(result) => bookmarks.push(result),
                    Err(err) => warn!("[safari] Skipping bookmark row: {err:?}"),
                }
            }
        }
        Err(err) => {
            error!("[safari] Failed to query Safari bookmarks: {err:?}");
            return Err(SafariError::BadSQL);
        }
    }
    bookmarks.dedup();
    Ok(bookmarks)
}

#[cfg(test)]
mod tests {
    use super::safari_bookmarks;
    use crate::utils::testing::TestBackup;

    #[test]
    fn test_safari_bookmarks() {
        let mut backup = TestBackup::new();
        backup.add_sqlite(
            "HomeDomain",
            "Library/Safari/Bookmarks.db",
            "CREATE TABLE bookmarks (id INTEGER PRIMARY KEY, special_id INTEGER, parent INTEGER, type INTEGER, title TEXT, url TEXT, num_children INTEGER);
             INSERT INTO bookmarks VALUES
                (0, 0, NULL, 1, '', NULL, 2),
                (1, 0, 0, 1, 'BookmarksBar', NULL, 1),
                (2, 0, 1, 1, '뉴스', NULL, 1),
                (3, 0, 2, 0, 'Yonhap', 'https://www.yna.co.kr/', 0),
                (4, 0, 0, 0, 'Apple', 'https://www.apple.com/', 0),
                (5, 0, 1, 0, 'Empty', NULL, 0);",
        );
        let index = backup.open();

        let bookmarks = safari_bookmarks(&index).unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[0].folder_path, "BookmarksBar/뉴스");
        assert_eq!(bookmarks[0].title, "Yonhap");
        assert_eq!(bookmarks[1].folder_path, "");
        assert_eq!(bookmarks[1].url, "https://www.apple.com/");
    }
}
