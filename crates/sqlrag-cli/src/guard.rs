//! Opt-in keyword audit for sanitized queries

use regex::Regex;
use std::sync::LazyLock;

use sqlrag_core::{Error, Result};

/// Statements and clauses that read-only callers never need
pub const DANGEROUS_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "INSERT", "UPDATE", "TRUNCATE", "ALTER", "CREATE", "REPLACE", "MERGE",
    "CALL", "EXEC", "EXECUTE", "GRANT", "REVOKE", "LOCK", "UNLOCK", "LOAD", "INTO", "OUTFILE",
    "DUMPFILE",
];

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = DANGEROUS_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b({})\b", alternation)).expect("valid regex")
});

static UNION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bUNION\b").expect("valid regex"));

/// Stricter check applied after `sanitizer::clean` when enabled.
///
/// Matches whole words, so `updated_at` passes while `REPLACE(name, ...)` is
/// rejected along with a real REPLACE statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryGuard;

impl QueryGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, sql: &str) -> Result<()> {
        if let Some(m) = KEYWORD.find(sql) {
            return Err(Error::UnsafeQuery(format!(
                "contains keyword '{}'",
                m.as_str().to_uppercase()
            )));
        }

        if sql.contains(';') {
            return Err(Error::UnsafeQuery("contains a semicolon".to_string()));
        }

        if sql.contains("--") || sql.contains("/*") || sql.contains("*/") {
            return Err(Error::UnsafeQuery("contains a comment".to_string()));
        }

        if UNION.is_match(sql) {
            return Err(Error::UnsafeQuery("contains UNION".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(sql: &str) -> String {
        match QueryGuard::new().check(sql) {
            Err(Error::UnsafeQuery(reason)) => reason,
            other => panic!("expected rejection for {:?}, got {:?}", sql, other),
        }
    }

    #[test]
    fn test_plain_select_passes() {
        let guard = QueryGuard::new();
        assert!(guard.check("SELECT id, updated_at FROM users WHERE created_by = 1").is_ok());
        assert!(guard
            .check("SELECT u.name, (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) FROM users u")
            .is_ok());
    }

    #[test]
    fn test_smuggled_statement_rejected() {
        assert_eq!(reason("SELECT 1; DROP TABLE users"), "contains keyword 'DROP'");
        assert_eq!(reason("SELECT 1; SELECT 2"), "contains a semicolon");
    }

    #[test]
    fn test_into_outfile_rejected() {
        assert_eq!(
            reason("SELECT * FROM users into outfile '/tmp/x'"),
            "contains keyword 'INTO'"
        );
    }

    #[test]
    fn test_comments_rejected() {
        assert_eq!(reason("SELECT 1 -- hidden"), "contains a comment");
        assert_eq!(reason("SELECT /* x */ 1"), "contains a comment");
    }

    #[test]
    fn test_union_rejected() {
        assert_eq!(
            reason("SELECT name FROM users UNION SELECT password FROM admins"),
            "contains UNION"
        );
    }
}
