use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_SQL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?i:sql)?\s*(.*?)\s*```").expect("static regex"));

static STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP|WITH).*?;")
        .expect("static regex")
});

/// Best-effort SQL extraction. Never fails; the caller validates the result.
pub fn extract_sql_statement(output: &str) -> String {
    if let Some(inner) = FENCED_SQL.captures(output).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }
    if let Some(statement) = STATEMENT.find(output) {
        return statement.as_str().trim().to_string();
    }
    output.trim().to_string()
}
