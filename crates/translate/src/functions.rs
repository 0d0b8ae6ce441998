//! SQL function catalogue per query dialect, used for `/supported-functions`
//! and to prime query-generation prompts.

use common::types::Dialect;
use serde_json::{json, Map, Value};

type Category = (&'static str, &'static [&'static str]);

const CATEGORIES: &[Category] = &[
    ("aggregate", &["AVG", "SUM", "COUNT", "MIN", "MAX", "GROUP_CONCAT"]),
    (
        "mathematical",
        &[
            "ROUND", "FLOOR", "CEIL", "ABS", "MOD", "POWER", "EXP", "SQRT", "LOG", "RAND", "SIGN",
            "TRUNCATE",
        ],
    ),
    (
        "string",
        &[
            "CONCAT", "SUBSTRING", "LENGTH", "UPPER", "LOWER", "TRIM", "LTRIM", "RTRIM", "REPLACE",
            "LOCATE", "LEFT", "RIGHT", "REPEAT", "REVERSE",
        ],
    ),
    (
        "date_time",
        &[
            "NOW", "CURDATE", "CURTIME", "YEAR", "MONTH", "DAY", "HOUR", "MINUTE", "SECOND",
            "TIMESTAMPDIFF", "DATE_FORMAT", "ADDDATE", "SUBDATE", "DATEDIFF", "DAYOFWEEK", "WEEK",
            "WEEKDAY", "LAST_DAY",
        ],
    ),
    ("conditional", &["IF", "IFNULL", "NULLIF", "COALESCE", "CASE WHEN"]),
    ("type_conversion", &["CAST", "CONVERT"]),
    (
        "grouping_ordering",
        &["GROUP BY", "ORDER BY", "DISTINCT", "HAVING", "LIMIT", "OFFSET"],
    ),
    (
        "joins_unions",
        &["INNER JOIN", "LEFT JOIN", "RIGHT JOIN", "FULL JOIN", "UNION", "UNION ALL"],
    ),
    (
        "window",
        &[
            "ROW_NUMBER", "RANK", "DENSE_RANK", "LAG", "LEAD", "NTILE", "FIRST_VALUE",
            "LAST_VALUE", "PERCENT_RANK",
        ],
    ),
    (
        "logical",
        &["AND", "OR", "NOT", "BETWEEN", "IN", "LIKE", "EXISTS", "ANY", "ALL"],
    ),
];

/// `(role, generic name, dialect spelling)`.
fn variants(dialect: Dialect) -> &'static [(&'static str, &'static str, &'static str)] {
    match dialect {
        Dialect::MySql => &[
            ("string_agg", "GROUP_CONCAT", "GROUP_CONCAT"),
            ("date_format", "DATE_FORMAT", "DATE_FORMAT"),
        ],
        Dialect::Postgres => &[
            ("string_agg", "GROUP_CONCAT", "STRING_AGG"),
            ("date_format", "DATE_FORMAT", "TO_CHAR"),
        ],
        Dialect::Trino => &[
            ("string_agg", "GROUP_CONCAT", "LISTAGG"),
            ("date_format", "DATE_FORMAT", "DATE_FORMAT"),
        ],
        _ => &[],
    }
}

/// Function names by category. With `None` the common list is returned
/// alongside each dialect's spelling of the functions that differ.
pub fn function_catalog(dialect: Option<Dialect>) -> Value {
    match dialect {
        None => {
            let common: Map<String, Value> = CATEGORIES
                .iter()
                .map(|(name, funcs)| (name.to_string(), json!(funcs)))
                .collect();
            let specific: Map<String, Value> = Dialect::QUERY_DIALECTS
                .iter()
                .map(|d| {
                    let spellings: Map<String, Value> = variants(*d)
                        .iter()
                        .map(|(role, _, spelled)| (role.to_string(), json!(spelled)))
                        .collect();
                    (d.as_str().to_string(), Value::Object(spellings))
                })
                .collect();
            json!({ "common": common, "database_specific": specific })
        }
        Some(dialect) => {
            let swaps = variants(dialect);
            let categories: Map<String, Value> = CATEGORIES
                .iter()
                .map(|(name, funcs)| {
                    let spelled: Vec<&str> = funcs
                        .iter()
                        .map(|f| {
                            swaps
                                .iter()
                                .find(|(_, generic, _)| generic == f)
                                .map_or(*f, |(_, _, spelled)| *spelled)
                        })
                        .collect();
                    (name.to_string(), json!(spelled))
                })
                .collect();
            Value::Object(categories)
        }
    }
}

const COMMON_REFERENCE: &[(&str, &str)] = &[
    ("Aggregate Functions", "AVG, SUM, COUNT, MIN, MAX"),
    (
        "Mathematical Functions",
        "ROUND, FLOOR, CEIL, ABS, MOD, POWER, EXP, SQRT, LOG",
    ),
    ("String Functions", "SUBSTRING, LENGTH, UPPER, LOWER, TRIM, REPLACE"),
    ("Date and Time Functions", "YEAR, MONTH, DAY, HOUR, MINUTE, SECOND"),
    ("Conditional Functions", "CASE WHEN, COALESCE, NULLIF"),
    ("Type Conversion", "CAST"),
    ("Window Functions", "ROW_NUMBER, RANK, DENSE_RANK, LAG, LEAD"),
];

fn specific_reference(dialect: Dialect) -> &'static [(&'static str, &'static str)] {
    match dialect {
        Dialect::MySql => &[
            (
                "String Aggregation",
                "GROUP_CONCAT(expression [ORDER BY column] [SEPARATOR separator])",
            ),
            ("Date Format", "DATE_FORMAT(date, format_string)"),
            ("String Concat", "CONCAT(str1, str2, ...)"),
            ("Current Timestamp", "NOW()"),
            (
                "Type Casting",
                "CAST(expression AS type) or CONVERT(expression, type)",
            ),
            ("JSON Functions", "JSON_EXTRACT, JSON_OBJECT, JSON_ARRAY"),
            ("Full Text Search", "MATCH() AGAINST()"),
        ],
        Dialect::Postgres => &[
            (
                "String Aggregation",
                "STRING_AGG(expression, delimiter [ORDER BY columns])",
            ),
            ("Date Format", "TO_CHAR(date, format_string)"),
            ("String Concat", "CONCAT(str1, str2, ...) or str1 || str2"),
            ("Current Timestamp", "CURRENT_TIMESTAMP"),
            ("Type Casting", "CAST(expression AS type) or expression::type"),
            ("JSON Functions", "jsonb_extract_path, jsonb_build_object"),
            ("Text Search", "to_tsvector, to_tsquery"),
        ],
        Dialect::Trino => &[
            ("String Aggregation", "LISTAGG(expression, delimiter)"),
            ("Date Format", "DATE_FORMAT(date, format_string)"),
            ("String Concat", "CONCAT(str1, str2, ...) or str1 || str2"),
            ("Current Timestamp", "CURRENT_TIMESTAMP"),
            ("Type Casting", "CAST(expression AS type)"),
            ("JSON Functions", "JSON_EXTRACT, JSON_PARSE, JSON_FORMAT"),
            ("Array Functions", "ARRAY_JOIN, ARRAY_CONTAINS, ARRAY_POSITION"),
        ],
        _ => &[],
    }
}

fn tips(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::MySql => &[
            "Use backticks (``) for table and column names",
            "LIMIT clause comes at the end of the query",
            "Use NULL-safe equality operator (<=>) for NULL comparisons",
        ],
        Dialect::Postgres => &[
            "Use double quotes (\"\") for case-sensitive identifiers",
            "Use ILIKE for case-insensitive pattern matching",
            "RETURNING clause can be used with INSERT/UPDATE/DELETE",
        ],
        Dialect::Trino => &[
            "Use catalogs and schemas to refer to tables (catalog.schema.table)",
            "UNNEST can be used to flatten arrays into rows",
            "WITH ORDINALITY can be used to add ordinal positions",
        ],
        _ => &[],
    }
}

/// Markdown function guide embedded into query-generation prompts.
pub fn function_reference(dialect: Dialect) -> String {
    let mut text = format!("# {} SQL Function Reference\n\n", dialect.as_str().to_uppercase());

    for (category, functions) in COMMON_REFERENCE {
        text.push_str(&format!("## {category}\n{functions}\n\n"));
    }
    for (category, syntax) in specific_reference(dialect) {
        text.push_str(&format!("## {category} (Database-specific)\n{syntax}\n\n"));
    }

    let tips = tips(dialect);
    if !tips.is_empty() {
        text.push_str(&format!("## {} Tips\n", dialect.display_name()));
        for tip in tips {
            text.push_str(&format!("- {tip}\n"));
        }
    }
    text
}
