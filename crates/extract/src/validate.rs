use common::types::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const LEADING_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "create", "alter", "drop", "with",
];

const COMMENT_MARKERS: &[&str] = &["--", "/*", "*/"];

static THREE_PART_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9_]+\.[a-z0-9_]+\.[a-z0-9_]+").expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxCheck {
    pub valid: bool,
    pub reason: String,
}

impl SyntaxCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
        }
    }

    fn fail(reason: &str) -> Self {
        Self {
            valid: false,
            reason: reason.to_string(),
        }
    }
}

/// Heuristic checks in fixed order; the first failure wins.
///
/// Comment markers are rejected anywhere in the text, including inside
/// string literals.
pub fn validate_syntax(sql: &str, dialect: Dialect) -> SyntaxCheck {
    let lowered = sql.trim().to_lowercase();

    if !LEADING_KEYWORDS.iter().any(|k| lowered.starts_with(k)) {
        return SyntaxCheck::fail("Invalid SQL command");
    }
    if sql.matches('(').count() != sql.matches(')').count() {
        return SyntaxCheck::fail("Unbalanced parentheses");
    }
    if !lowered.ends_with(';') {
        return SyntaxCheck::fail("Query should end with a semicolon");
    }

    match dialect {
        Dialect::MySql if sql.matches('`').count() % 2 != 0 => {
            return SyntaxCheck::fail("Unbalanced backticks in MySQL query");
        }
        Dialect::Postgres if sql.matches('"').count() % 2 != 0 => {
            return SyntaxCheck::fail("Unbalanced double quotes in PostgreSQL query");
        }
        Dialect::Trino if lowered.contains("catalog.") && !THREE_PART_NAME.is_match(&lowered) => {
            return SyntaxCheck::fail("Invalid catalog.schema.table format in Trino query");
        }
        _ => {}
    }

    if COMMENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return SyntaxCheck::fail("Possible SQL injection detected (comment markers)");
    }

    SyntaxCheck::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(sql: &str, dialect: Dialect) -> String {
        validate_syntax(sql, dialect).reason
    }

    #[test]
    fn missing_semicolon() {
        assert_eq!(
            validate_syntax("SELECT * FROM t", Dialect::Postgres),
            SyntaxCheck {
                valid: false,
                reason: "Query should end with a semicolon".into()
            }
        );
    }

    #[test]
    fn valid_query_has_empty_reason() {
        assert_eq!(
            validate_syntax("SELECT * FROM t;", Dialect::Postgres),
            SyntaxCheck {
                valid: true,
                reason: String::new()
            }
        );
    }

    #[test]
    fn checks_run_in_order() {
        assert_eq!(reason("EXPLAIN SELECT 1;", Dialect::MySql), "Invalid SQL command");
        assert_eq!(reason("SELECT COUNT(* FROM t", Dialect::MySql), "Unbalanced parentheses");
        assert_eq!(
            reason("SELECT `id FROM t;", Dialect::MySql),
            "Unbalanced backticks in MySQL query"
        );
        assert_eq!(
            reason("SELECT \"id FROM t;", Dialect::Postgres),
            "Unbalanced double quotes in PostgreSQL query"
        );
        assert_eq!(
            reason("SELECT * FROM t; -- all rows;", Dialect::MySql),
            "Possible SQL injection detected (comment markers)"
        );
    }

    #[test]
    fn quote_checks_are_dialect_specific() {
        assert!(validate_syntax("SELECT \"id FROM t;", Dialect::MySql).valid);
        assert!(validate_syntax("SELECT `id FROM t;", Dialect::Postgres).valid);
    }

    #[test]
    fn trino_catalog_references_need_three_parts() {
        assert_eq!(
            reason("SELECT * FROM catalog.orders;", Dialect::Trino),
            "Invalid catalog.schema.table format in Trino query"
        );
        assert!(validate_syntax("SELECT * FROM catalog.sales.orders;", Dialect::Trino).valid);
    }

    #[test]
    fn comment_markers_inside_literals_are_still_flagged() {
        assert!(!validate_syntax("SELECT '--' AS dash;", Dialect::Postgres).valid);
    }
}
