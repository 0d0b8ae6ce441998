//! SQL text helpers shared by the SQL backends.

use crate::error::AdapterError;
use common::types::{Dialect, Record, SimplifiedColumn, SqlValue};
use translate::{create_table_statement, simplified_to_table, DdlOptions, DialectRules};

/// Upper-cased first word of the statement.
pub fn query_kind(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

pub fn returns_rows(query_kind: &str) -> bool {
    query_kind == "SELECT"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `$1, $2, ...`
    Dollar,
    /// `@P1, @P2, ...`
    AtP,
}

impl Placeholder {
    fn render(&self, index: usize) -> String {
        match self {
            Placeholder::Question => "?".to_string(),
            Placeholder::Dollar => format!("${index}"),
            Placeholder::AtP => format!("@P{index}"),
        }
    }
}

/// Parameterised single-row `INSERT` for the columns present in `record`.
pub fn insert_statement(
    dialect: Dialect,
    placeholder: Placeholder,
    table: &str,
    record: &Record,
) -> String {
    let rules = DialectRules::for_dialect(dialect);
    let columns: Vec<String> = record.columns().map(|c| rules.quote(c)).collect();
    let params: Vec<String> = (1..=record.len()).map(|i| placeholder.render(i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        rules.quote(table),
        columns.join(", "),
        params.join(", ")
    )
}

/// `CREATE TABLE IF NOT EXISTS` for a synthetic-data table.
pub fn create_table_sql(dialect: Dialect, table: &str, columns: &[SimplifiedColumn]) -> String {
    let definition = simplified_to_table(table, columns, dialect);
    create_table_statement(&definition, dialect, DdlOptions { if_not_exists: true })
}

/// Strips auto-increment fields and drops records left with no fields.
pub fn insertable_records(columns: &[SimplifiedColumn], records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .map(|record| record.without_auto_increment(columns))
        .filter(|record| !record.is_empty())
        .collect()
}

fn mismatch(value: &SqlValue, target: &str) -> AdapterError {
    AdapterError::invalid_input(format!("cannot bind {value:?} as {target}"))
}

pub(crate) fn int_param(value: &SqlValue) -> Result<Option<i64>, AdapterError> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Int(i) => Ok(Some(*i)),
        SqlValue::Bool(b) => Ok(Some(i64::from(*b))),
        SqlValue::Float(f) if f.fract() == 0.0 => Ok(Some(*f as i64)),
        SqlValue::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| mismatch(value, "integer")),
        SqlValue::Float(_) => Err(mismatch(value, "integer")),
    }
}

pub(crate) fn float_param(value: &SqlValue) -> Result<Option<f64>, AdapterError> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Int(i) => Ok(Some(*i as f64)),
        SqlValue::Float(f) => Ok(Some(*f)),
        SqlValue::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| mismatch(value, "float")),
        SqlValue::Bool(_) => Err(mismatch(value, "float")),
    }
}

pub(crate) fn bool_param(value: &SqlValue) -> Result<Option<bool>, AdapterError> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Bool(b) => Ok(Some(*b)),
        SqlValue::Int(0) => Ok(Some(false)),
        SqlValue::Int(1) => Ok(Some(true)),
        _ => Err(mismatch(value, "boolean")),
    }
}

pub(crate) fn text_param(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Null => None,
        SqlValue::Int(i) => Some(i.to_string()),
        SqlValue::Float(f) => Some(f.to_string()),
        SqlValue::Bool(b) => Some(b.to_string()),
        SqlValue::Text(s) => Some(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{SimpleType, SqlValue};

    #[test]
    fn query_kind_is_first_word() {
        assert_eq!(query_kind("  select *\nfrom t"), "SELECT");
        assert_eq!(query_kind("Update t set a = 1"), "UPDATE");
        assert_eq!(query_kind(""), "");
        assert!(returns_rows(&query_kind("SELECT 1")));
        assert!(!returns_rows(&query_kind("WITH x AS (SELECT 1) SELECT * FROM x")));
    }

    #[test]
    fn insert_uses_dialect_quoting_and_placeholders() {
        let mut record = Record::new();
        record.push("name", SqlValue::Text("a".into()));
        record.push("age", SqlValue::Int(3));

        assert_eq!(
            insert_statement(Dialect::Postgres, Placeholder::Dollar, "people", &record),
            "INSERT INTO \"people\" (\"name\", \"age\") VALUES ($1, $2)"
        );
        assert_eq!(
            insert_statement(Dialect::MySql, Placeholder::Question, "people", &record),
            "INSERT INTO `people` (`name`, `age`) VALUES (?, ?)"
        );
        assert_eq!(
            insert_statement(Dialect::SqlServer, Placeholder::AtP, "people", &record),
            "INSERT INTO [people] ([name], [age]) VALUES (@P1, @P2)"
        );
    }

    #[test]
    fn parameter_conversions() {
        assert_eq!(int_param(&SqlValue::Text(" 7 ".into())).unwrap(), Some(7));
        assert_eq!(int_param(&SqlValue::Null).unwrap(), None);
        assert!(int_param(&SqlValue::Float(1.5)).is_err());
        assert_eq!(float_param(&SqlValue::Int(2)).unwrap(), Some(2.0));
        assert_eq!(bool_param(&SqlValue::Int(1)).unwrap(), Some(true));
        assert!(bool_param(&SqlValue::Text("maybe".into())).is_err());
        assert_eq!(text_param(&SqlValue::Bool(true)).as_deref(), Some("true"));
    }

    #[test]
    fn records_with_only_auto_increment_fields_are_dropped() {
        let columns = vec![
            SimplifiedColumn::new("id", SimpleType::Int).auto_increment(),
            SimplifiedColumn::new("name", SimpleType::String),
        ];
        let mut only_id = Record::new();
        only_id.push("id", SqlValue::Int(1));
        let mut full = Record::new();
        full.push("id", SqlValue::Int(2));
        full.push("name", SqlValue::Text("b".into()));

        let kept = insertable_records(&columns, &[only_id, full]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].columns().collect::<Vec<_>>(), ["name"]);
    }
}
