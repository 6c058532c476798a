use crate::utils::strings::unicode_forms;
use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    FileId,
    Domain,
    RelativePath,
    Flags,
}

impl Field {
    fn column(&self) -> &'static str {
        match self {
            Field::FileId => "fileID",
            Field::Domain => "domain",
            Field::RelativePath => "relativePath",
            Field::Flags => "flags",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Equals(Field, Value),
    NotEquals(Field, Value),
    Like(Field, String),
}

/**
 * Catalog predicate applied inside the `Manifest.db` query.
 * All clauses are joined with `AND`. An empty filter matches every row.
 * Text clauses match the NFC and NFD spelling of their value, so NFD catalog rows are found with NFC input
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    clauses: Vec<Clause>,
}

impl EntryFilter {
    pub fn new() -> EntryFilter {
        EntryFilter::default()
    }

    pub fn domain(mut self, domain: &str) -> EntryFilter {
        self.clauses
            .push(Clause::Equals(Field::Domain, Value::Text(domain.to_string())));
        self
    }

    /// SQL `LIKE` pattern on the domain. `%` and `_` are wildcards
    pub fn domain_like(mut self, pattern: &str) -> EntryFilter {
        self.clauses.push(Clause::Like(Field::Domain, pattern.to_string()));
        self
    }

    pub fn path(mut self, relative_path: &str) -> EntryFilter {
        self.clauses.push(Clause::Equals(
            Field::RelativePath,
            Value::Text(relative_path.to_string()),
        ));
        self
    }

    /// SQL `LIKE` pattern on the relative path
    pub fn path_like(mut self, pattern: &str) -> EntryFilter {
        self.clauses
            .push(Clause::Like(Field::RelativePath, pattern.to_string()));
        self
    }

    /// Substring match on the relative path. Wildcards in `keyword` are matched literally
    pub fn path_contains(self, keyword: &str) -> EntryFilter {
        let pattern = format!("%{}%", escape_like(keyword));
        self.path_like(&pattern)
    }

    /// Suffix match on the relative path
    pub fn path_ends_with(self, suffix: &str) -> EntryFilter {
        let pattern = format!("%{}", escape_like(suffix));
        self.path_like(&pattern)
    }

    pub fn file_id(mut self, file_id: &str) -> EntryFilter {
        self.clauses
            .push(Clause::Equals(Field::FileId, Value::Text(file_id.to_string())));
        self
    }

    /// Skip directory-like entries (`flags == 2`)
    pub fn files_only(mut self) -> EntryFilter {
        self.clauses
            .push(Clause::NotEquals(Field::Flags, Value::Integer(2)));
        self
    }

    /// Build the `WHERE` clause and its bound parameters
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        if self.clauses.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut parts = Vec::new();
        let mut params = Vec::new();
        for clause in &self.clauses {
            match clause {
                Clause::Equals(field, Value::Text(text)) => {
                    parts.push(alternatives(field.column(), "= ?", text, &mut params));
                }
                Clause::Equals(field, value) => {
                    parts.push(format!("{} = ?", field.column()));
                    params.push(value.clone());
                }
                Clause::NotEquals(field, value) => {
                    // NULL flags are treated as files
                    parts.push(format!("IFNULL({}, 0) != ?", field.column()));
                    params.push(value.clone());
                }
                Clause::Like(field, pattern) => {
                    parts.push(alternatives(
                        field.column(),
                        "LIKE ? ESCAPE '\\'",
                        pattern,
                        &mut params,
                    ));
                }
            }
        }
        (format!(" WHERE {}", parts.join(" AND ")), params)
    }
}

/// One comparison per Unicode spelling of `text`, joined with `OR`
fn alternatives(column: &str, comparison: &str, text: &str, params: &mut Vec<Value>) -> String {
    let forms = unicode_forms(text);
    let parts: Vec<String> = forms
        .iter()
        .map(|_| format!("{column} {comparison}"))
        .collect();
    params.extend(forms.into_iter().map(Value::Text));
    if parts.len() == 1 {
        return parts.join("");
    }
    format!("({})", parts.join(" OR "))
}

/// Escape `LIKE` wildcards with a backslash
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, EntryFilter};
    use rusqlite::types::Value;

    #[test]
    fn test_where_clause() {
        let filter = EntryFilter::new()
            .domain("HomeDomain")
            .path_like("Library/Safari/Thumbnails/%")
            .files_only();
        let (clause, params) = filter.where_clause();

        assert_eq!(
            clause,
            " WHERE domain = ? AND relativePath LIKE ? ESCAPE '\\' AND IFNULL(flags, 0) != ?"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], Value::Integer(2));
    }

    #[test]
    fn test_decomposed_spelling() {
        let (clause, params) = EntryFilter::new()
            .path("Media/\u{d55c}.jpg")
            .path_contains("\u{d55c}")
            .where_clause();
        assert_eq!(
            clause,
            " WHERE (relativePath = ? OR relativePath = ?) AND (relativePath LIKE ? ESCAPE '\\' OR relativePath LIKE ? ESCAPE '\\')"
        );
        assert_eq!(
            params[1],
            Value::Text(String::from("Media/\u{1112}\u{1161}\u{11ab}.jpg"))
        );
        assert_eq!(
            params[3],
            Value::Text(String::from("%\u{1112}\u{1161}\u{11ab}%"))
        );
    }

    #[test]
    fn test_empty_filter() {
        let (clause, params) = EntryFilter::new().where_clause();
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        let (_, params) = EntryFilter::new().path_contains("a_b").where_clause();
        assert_eq!(params[0], Value::Text(String::from("%a\\_b%")));
    }
}
