use crate::error::ForgeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Hub representation every translation goes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub foreign_key: Option<ForeignKey>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// Scalar column default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl DefaultValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DefaultValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_current_timestamp(&self) -> bool {
        self.as_text()
            .is_some_and(|s| s.eq_ignore_ascii_case("CURRENT_TIMESTAMP"))
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            DefaultValue::Int(i) => write!(f, "{i}"),
            DefaultValue::Float(x) => write!(f, "{x}"),
            DefaultValue::Text(s) => f.write_str(s),
        }
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
            foreign_key: None,
            unique: false,
            default: None,
            nullable: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::input("Table name must not be empty"));
        }
        if self.columns.is_empty() {
            return Err(ForgeError::input(format!(
                "Table '{}' must have at least one column",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ForgeError::input(format!(
                    "Duplicate column '{}' in table '{}'",
                    column.name, self.name
                )));
            }
        }
        Ok(())
    }
}

impl CanonicalSchema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Checks the structural invariants: at least one table, unique table
    /// names, and per-table column rules.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.tables.is_empty() {
            return Err(ForgeError::input("Schema must contain at least one table"));
        }
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(ForgeError::input(format!(
                    "Duplicate table '{}' in schema",
                    table.name
                )));
            }
            table.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_flags_default_to_false() {
        let column: Column =
            serde_json::from_value(json!({"name": "id", "data_type": "INT"})).unwrap();
        assert!(!column.primary_key);
        assert!(!column.unique);
        assert!(!column.nullable);
        assert!(column.foreign_key.is_none());
        assert!(column.default.is_none());
    }

    #[test]
    fn defaults_keep_their_scalar_kind() {
        let column: Column = serde_json::from_value(json!({
            "name": "created_at",
            "data_type": "TIMESTAMP",
            "default": "current_timestamp"
        }))
        .unwrap();
        assert!(column.default.as_ref().unwrap().is_current_timestamp());

        let flag: Column = serde_json::from_value(json!({
            "name": "active", "data_type": "BOOLEAN", "default": true
        }))
        .unwrap();
        assert_eq!(flag.default, Some(DefaultValue::Bool(true)));

        let count: Column = serde_json::from_value(json!({
            "name": "n", "data_type": "INT", "default": 0
        }))
        .unwrap();
        assert_eq!(count.default, Some(DefaultValue::Int(0)));
    }

    #[test]
    fn validate_rejects_duplicates_and_empties() {
        let empty = CanonicalSchema::new(vec![]);
        assert!(empty.validate().is_err());

        let dup_tables = CanonicalSchema::new(vec![
            Table::new("t", vec![Column::new("id", "INT")]),
            Table::new("t", vec![Column::new("id", "INT")]),
        ]);
        assert!(dup_tables.validate().unwrap_err().message().contains("Duplicate table"));

        let dup_columns = CanonicalSchema::new(vec![Table::new(
            "t",
            vec![Column::new("id", "INT"), Column::new("id", "TEXT")],
        )]);
        assert!(dup_columns.validate().unwrap_err().message().contains("Duplicate column"));

        let no_columns = CanonicalSchema::new(vec![Table::new("t", vec![])]);
        assert!(no_columns.validate().is_err());
    }

    #[test]
    fn primary_key_columns_keep_declaration_order() {
        let table = Table::new(
            "order_items",
            vec![
                Column::new("order_id", "INT").primary_key(),
                Column::new("qty", "INT"),
                Column::new("product_id", "INT").primary_key(),
            ],
        );
        let names: Vec<_> = table.primary_key_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["order_id", "product_id"]);
    }
}
