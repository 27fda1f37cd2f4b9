//! Normalization of raw model output into a single SELECT statement
//!
//! The checks here are prefix-based and do not parse SQL. A statement that
//! starts with SELECT but smuggles a second statement after an inner
//! semicolon, or hides text in a comment, passes. `QueryGuard` narrows that
//! gap with keyword checks; closing it requires a real SQL parser.

use regex::Regex;
use std::sync::LazyLock;

use sqlrag_core::{Error, Result};

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```").expect("valid regex"));

/// Fence tags for the dialects the prompt can target
static LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:mysql|postgresql|postgres|pgsql|sqlite|tsql|plsql|sql)\b\s*")
        .expect("valid regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Turn raw completion text into a single-line SELECT statement.
///
/// 1. drop code-fence markers and a leading dialect tag (`sql`, `mysql`, `postgresql`, ...)
/// 2. collapse whitespace runs to one space and trim
/// 3. drop one trailing semicolon
/// 4. reject empty output and anything not starting with SELECT
pub fn clean(raw: &str) -> Result<String> {
    let unfenced = FENCE.replace_all(raw, "");
    let untagged = LANGUAGE_TAG.replace(&unfenced, "");

    let collapsed = WHITESPACE.replace_all(&untagged, " ");
    let mut sql = collapsed.trim();

    if let Some(stripped) = sql.strip_suffix(';') {
        sql = stripped.trim_end();
    }

    if sql.is_empty() {
        return Err(Error::EmptyGeneration);
    }

    if !sql.to_uppercase().starts_with("SELECT") {
        return Err(Error::not_a_select(sql));
    }

    Ok(sql.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_fenced_block_with_language_tag() {
        assert_snapshot!(clean("```sql\nSELECT * FROM users;\n```").unwrap(), @"SELECT * FROM users");
    }

    #[test]
    fn test_bare_language_tag() {
        assert_snapshot!(
            clean("sql SELECT id, name FROM orders WHERE total > 100").unwrap(),
            @"SELECT id, name FROM orders WHERE total > 100"
        );
    }

    #[test]
    fn test_mysql_tag_is_case_insensitive() {
        assert_eq!(
            clean("```MySQL\nselect count(*) from orders\n```").unwrap(),
            "select count(*) from orders"
        );
    }

    #[test]
    fn test_drop_is_not_a_select() {
        let err = clean("DROP TABLE users").unwrap_err();
        assert!(matches!(err, Error::NotASelect(_)));
        assert!(err.to_string().contains("DROP TABLE users"));
    }

    #[test]
    fn test_empty_and_blank_output() {
        assert!(matches!(clean(""), Err(Error::EmptyGeneration)));
        assert!(matches!(clean(" \n\t "), Err(Error::EmptyGeneration)));
        assert!(matches!(clean("```\n```"), Err(Error::EmptyGeneration)));
        assert!(matches!(clean("sql ;"), Err(Error::EmptyGeneration)));
    }

    #[test]
    fn test_exactly_one_trailing_semicolon_removed() {
        assert_eq!(clean("SELECT 1;").unwrap(), "SELECT 1");
        assert_eq!(clean("SELECT 1 ;  \n").unwrap(), "SELECT 1");
        assert_eq!(clean("SELECT 1;;").unwrap(), "SELECT 1;");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let sql = clean("SELECT  id,\n\tname\r\n  FROM   users\n\n WHERE id = 1").unwrap();
        assert_eq!(sql, "SELECT id, name FROM users WHERE id = 1");
        assert!(!sql.chars().zip(sql.chars().skip(1)).any(|(a, b)| a.is_whitespace() && b.is_whitespace()));
    }

    #[test]
    fn test_clean_is_idempotent_on_valid_output() {
        for raw in [
            "```sql\nSELECT * FROM users;\n```",
            "sql SELECT id FROM orders",
            "  select name\nfrom products ; ",
        ] {
            let once = clean(raw).unwrap();
            assert_eq!(clean(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_column_named_like_tag_is_kept() {
        assert_eq!(
            clean("SELECT sql_text FROM audit_log").unwrap(),
            "SELECT sql_text FROM audit_log"
        );
    }

    #[test]
    fn test_other_dialect_fence_tags_are_stripped() {
        for raw in [
            "```postgresql\nSELECT 1\n```",
            "```postgres\nSELECT 1\n```",
            "```SQLite\nSELECT 1\n```",
            "```tsql\nSELECT 1\n```",
        ] {
            assert_eq!(clean(raw).unwrap(), "SELECT 1", "{raw:?}");
        }
    }

    #[test]
    fn test_prose_before_query_is_rejected() {
        let err = clean("Here is the query: SELECT 1").unwrap_err();
        assert!(matches!(err, Error::NotASelect(_)));
    }

    #[test]
    fn test_secondary_statement_is_not_caught() {
        // prefix check only; see QueryGuard
        assert_eq!(
            clean("SELECT 1; DROP TABLE users").unwrap(),
            "SELECT 1; DROP TABLE users"
        );
    }
}
