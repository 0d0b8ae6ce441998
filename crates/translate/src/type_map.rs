use crate::dialect::DialectRules;
use common::types::{Column, Dialect, SimpleType};

/// One reverse-mapping rule: any token found in the lowercased native type
/// selects `target`.
struct TypeRule {
    tokens: &'static [&'static str],
    target: SimpleType,
}

const INT_TOKENS: &[&str] = &["int", "serial", "bigint", "smallint"];

/// Evaluated top to bottom, first match wins. Booleans come first because
/// `tinyint(1)` also contains `int`.
const RULES: &[TypeRule] = &[
    TypeRule {
        tokens: &["bool", "boolean", "tinyint(1)"],
        target: SimpleType::Boolean,
    },
    TypeRule {
        tokens: INT_TOKENS,
        target: SimpleType::Int,
    },
    TypeRule {
        tokens: &["varchar", "char", "text", "string"],
        target: SimpleType::String,
    },
    TypeRule {
        tokens: &["date", "time", "timestamp"],
        target: SimpleType::Date,
    },
    TypeRule {
        tokens: &["float", "double", "decimal", "numeric", "real"],
        target: SimpleType::Float,
    },
];

fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack.contains(t))
}

/// Collapses a native column type into one of the five simplified buckets.
pub fn to_simplified_type(native: &str) -> SimpleType {
    let lowered = native.to_ascii_lowercase();
    RULES
        .iter()
        .find(|rule| contains_any(&lowered, rule.tokens))
        .map(|rule| rule.target)
        .unwrap_or(SimpleType::String)
}

pub fn to_native_type(simple: SimpleType, dialect: Dialect) -> &'static str {
    DialectRules::for_dialect(dialect).native_type(simple)
}

pub fn is_int_family(native: &str) -> bool {
    contains_any(&native.to_ascii_lowercase(), INT_TOKENS)
}

/// Integer-family primary keys are rendered as auto-incrementing.
pub fn is_auto_increment_eligible(column: &Column) -> bool {
    column.primary_key && is_int_family(&column.data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tinyint_one_is_boolean_not_int() {
        assert_eq!(to_simplified_type("tinyint(1)"), SimpleType::Boolean);
        assert_eq!(to_simplified_type("TINYINT(1)"), SimpleType::Boolean);
        assert_eq!(to_simplified_type("TINYINT"), SimpleType::Int);
    }

    #[test]
    fn each_rule_classifies_its_family() {
        let cases = [
            ("BOOLEAN", SimpleType::Boolean),
            ("bool", SimpleType::Boolean),
            ("INT", SimpleType::Int),
            ("BIGSERIAL", SimpleType::Int),
            ("smallint", SimpleType::Int),
            ("VARCHAR(120)", SimpleType::String),
            ("nchar(2)", SimpleType::String),
            ("TEXT", SimpleType::String),
            ("DATE", SimpleType::Date),
            ("DATETIME", SimpleType::Date),
            ("timestamp with time zone", SimpleType::Date),
            ("DECIMAL(10,2)", SimpleType::Float),
            ("double precision", SimpleType::Float),
            ("REAL", SimpleType::Float),
        ];
        for (native, expected) in cases {
            assert_eq!(to_simplified_type(native), expected, "{native}");
        }
    }

    #[test]
    fn unknown_types_fall_back_to_string() {
        assert_eq!(to_simplified_type("geometry"), SimpleType::String);
        assert_eq!(to_simplified_type("uuid"), SimpleType::String);
    }

    #[test]
    fn auto_increment_needs_int_primary_key() {
        assert!(is_auto_increment_eligible(&Column::new("id", "INT").primary_key()));
        assert!(!is_auto_increment_eligible(&Column::new("id", "INT")));
        assert!(!is_auto_increment_eligible(
            &Column::new("code", "VARCHAR(10)").primary_key()
        ));
    }

    #[test]
    fn forward_mapping_is_per_dialect() {
        assert_eq!(to_native_type(SimpleType::String, Dialect::MySql), "VARCHAR(255)");
        assert_eq!(to_native_type(SimpleType::Boolean, Dialect::SqlServer), "BIT");
        assert_eq!(to_native_type(SimpleType::Float, Dialect::Sqlite), "REAL");
        assert_eq!(to_native_type(SimpleType::Datetime, Dialect::Postgres), "TIMESTAMP");
        assert_eq!(to_native_type(SimpleType::Email, Dialect::SqlServer), "NVARCHAR(100)");
    }
}
