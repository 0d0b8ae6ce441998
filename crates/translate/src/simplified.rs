use crate::type_map::{is_auto_increment_eligible, to_simplified_type};
use common::error::ForgeError;
use common::types::simplified::DEFAULT_SIMPLIFIED_COUNT;
use common::types::{
    CanonicalSchema, ColumnOptions, SimpleType, SimplifiedColumn, SimplifiedSchema, Table,
};
use once_cell::sync::Lazy;
use regex::Regex;

static VARCHAR_LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"varchar\((\d+)\)").expect("static regex"));

/// Converts a canonical table into the synthetic-data format. Deterministic.
pub fn to_simplified(table: &Table) -> SimplifiedSchema {
    let columns = table
        .columns
        .iter()
        .map(|column| {
            let column_type = to_simplified_type(&column.data_type);
            let mut options = ColumnOptions::default();

            if column_type == SimpleType::String {
                let lowered = column.data_type.to_ascii_lowercase();
                if let Some(max) = VARCHAR_LENGTH
                    .captures(&lowered)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                {
                    options.max = Some(max);
                    options.min = Some(1);
                }
            }
            if column.unique {
                options.unique = Some(true);
            }
            if column_type == SimpleType::Date
                && column
                    .default
                    .as_ref()
                    .and_then(|d| d.as_text())
                    .is_some_and(|d| d == "CURRENT_TIMESTAMP")
            {
                options.past = Some(true);
            }

            SimplifiedColumn {
                name: column.name.clone(),
                column_type,
                auto_increment: is_auto_increment_eligible(column),
                not_null: false,
                options: (!options.is_empty()).then_some(options),
            }
        })
        .collect();

    SimplifiedSchema {
        table_name: table.name.clone(),
        count: DEFAULT_SIMPLIFIED_COUNT,
        columns,
    }
}

/// Picks `name` from the schema, or the first table when no name is given.
#[track_caller]
pub fn select_table<'a>(
    schema: &'a CanonicalSchema,
    name: Option<&str>,
) -> Result<&'a Table, ForgeError> {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => schema
            .table(name)
            .ok_or_else(|| ForgeError::input(format!("Table '{name}' not found in schema"))),
        None => schema
            .tables
            .first()
            .ok_or_else(|| ForgeError::input("Schema must contain at least one table")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{Column, DefaultValue};
    use serde_json::json;

    fn accounts() -> Table {
        Table::new(
            "accounts",
            vec![
                Column::new("id", "BIGINT").primary_key(),
                Column::new("handle", "VARCHAR(32)").unique(),
                Column::new("active", "tinyint(1)"),
                Column::new("created", "DATE")
                    .default_value(DefaultValue::Text("CURRENT_TIMESTAMP".into())),
                Column::new("balance", "DECIMAL(12,2)"),
            ],
        )
    }

    #[test]
    fn flattens_constraints_into_options() {
        let simplified = to_simplified(&accounts());
        let value = serde_json::to_value(&simplified).unwrap();
        assert_eq!(
            value,
            json!({
                "tableName": "accounts",
                "count": 100,
                "columns": [
                    {"name": "id", "type": "int", "autoIncrement": true},
                    {"name": "handle", "type": "string", "autoIncrement": false,
                     "options": {"min": 1, "max": 32, "unique": true}},
                    {"name": "active", "type": "boolean", "autoIncrement": false},
                    {"name": "created", "type": "date", "autoIncrement": false,
                     "options": {"past": true}},
                    {"name": "balance", "type": "float", "autoIncrement": false}
                ]
            })
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(to_simplified(&accounts()), to_simplified(&accounts()));
    }

    #[test]
    fn lowercase_current_timestamp_is_not_past() {
        let table = Table::new(
            "t",
            vec![Column::new("d", "DATE").default_value(DefaultValue::Text("current_timestamp".into()))],
        );
        assert!(to_simplified(&table).columns[0].options.is_none());
    }

    #[test]
    fn select_table_by_name_or_first() {
        let schema = CanonicalSchema::new(vec![
            accounts(),
            Table::new("tags", vec![Column::new("label", "TEXT")]),
        ]);
        assert_eq!(select_table(&schema, None).unwrap().name, "accounts");
        assert_eq!(select_table(&schema, Some("tags")).unwrap().name, "tags");
        let err = select_table(&schema, Some("nope")).unwrap_err();
        assert_eq!(err.message(), "Table 'nope' not found in schema");
    }
}
