use crate::dialect::{AutoIncrementStyle, DialectRules};
use crate::type_map::is_auto_increment_eligible;
use common::types::{
    CanonicalSchema, Column, DefaultValue, Dialect, SimplifiedColumn, Table,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DdlOptions {
    pub if_not_exists: bool,
}

/// Renders one `CREATE TABLE` per table, separated by a blank line.
pub fn synthesize(schema: &CanonicalSchema, dialect: Dialect) -> String {
    synthesize_with(schema, dialect, DdlOptions::default())
}

pub fn synthesize_with(schema: &CanonicalSchema, dialect: Dialect, options: DdlOptions) -> String {
    schema
        .tables
        .iter()
        .map(|table| create_table_statement(table, dialect, options))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn encodes_auto_increment(data_type: &str) -> bool {
    let lowered = data_type.to_ascii_lowercase();
    ["serial", "auto_increment", "autoincrement", "identity"]
        .iter()
        .any(|t| lowered.contains(t))
}

pub fn create_table_statement(table: &Table, dialect: Dialect, options: DdlOptions) -> String {
    let rules = DialectRules::for_dialect(dialect);
    let pk_columns: Vec<&Column> = table.primary_key_columns().collect();
    let inline_pk = rules.auto_increment == AutoIncrementStyle::InlinePrimaryKey
        && pk_columns.len() == 1
        && is_auto_increment_eligible(pk_columns[0])
        && !encodes_auto_increment(&pk_columns[0].data_type);

    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| format!("  {}", column_definition(column, rules, inline_pk)))
        .collect();

    if !pk_columns.is_empty() && !inline_pk {
        let names: Vec<String> = pk_columns.iter().map(|c| rules.quote(&c.name)).collect();
        lines.push(format!("  PRIMARY KEY ({})", names.join(", ")));
    }

    for column in &table.columns {
        if let Some(fk) = &column.foreign_key {
            lines.push(format!(
                "  FOREIGN KEY ({}) REFERENCES {}({})",
                rules.quote(&column.name),
                rules.quote(&fk.table),
                rules.quote(&fk.column)
            ));
        }
    }

    let quoted_table = rules.quote(&table.name);
    let header = match (options.if_not_exists, dialect) {
        (false, _) => format!("CREATE TABLE {quoted_table}"),
        (true, Dialect::SqlServer) => format!(
            "IF NOT EXISTS (SELECT * FROM sysobjects WHERE name='{}' AND xtype='U')\nCREATE TABLE {quoted_table}",
            table.name.replace('\'', "''")
        ),
        (true, _) => format!("CREATE TABLE IF NOT EXISTS {quoted_table}"),
    };

    format!("{header} (\n{}\n);", lines.join(",\n"))
}

fn column_definition(column: &Column, rules: &DialectRules, inline_pk: bool) -> String {
    let auto_increment =
        is_auto_increment_eligible(column) && !encodes_auto_increment(&column.data_type);

    let data_type = match rules.auto_increment {
        AutoIncrementStyle::SerialType if auto_increment => {
            if column.data_type.to_ascii_lowercase().contains("bigint") {
                "BIGSERIAL"
            } else {
                "SERIAL"
            }
        }
        AutoIncrementStyle::InlinePrimaryKey if auto_increment && inline_pk => "INTEGER",
        _ => column.data_type.as_str(),
    };

    let mut parts = vec![rules.quote(&column.name), data_type.to_string()];

    if !column.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        parts.push(format!("DEFAULT {}", render_default(default, rules)));
    }
    if column.unique && !column.primary_key {
        parts.push("UNIQUE".to_string());
    }
    if auto_increment {
        match rules.auto_increment {
            AutoIncrementStyle::Suffix(keyword) => parts.push(keyword.to_string()),
            AutoIncrementStyle::InlinePrimaryKey if inline_pk => {
                parts.push("PRIMARY KEY AUTOINCREMENT".to_string())
            }
            _ => {}
        }
    }

    parts.join(" ")
}

fn render_default(value: &DefaultValue, rules: &DialectRules) -> String {
    match value {
        DefaultValue::Text(text) if value.is_current_timestamp() => text.clone(),
        DefaultValue::Text(text) => format!("'{}'", text.replace('\'', "''")),
        DefaultValue::Bool(b) => rules.bool_literal(*b).to_string(),
        other => other.to_string(),
    }
}

/// Maps client-supplied synthetic-data columns onto a canonical table.
///
/// Auto-increment columns become the primary key, `notNull` columns are
/// NOT NULL, and everything else is nullable.
pub fn simplified_to_table(name: &str, columns: &[SimplifiedColumn], dialect: Dialect) -> Table {
    let rules = DialectRules::for_dialect(dialect);
    let columns = columns
        .iter()
        .map(|sc| Column {
            name: sc.name.clone(),
            data_type: rules.native_type(sc.column_type).to_string(),
            primary_key: sc.auto_increment,
            foreign_key: None,
            unique: sc
                .options
                .as_ref()
                .and_then(|o| o.unique)
                .unwrap_or(false),
            default: None,
            nullable: !(sc.auto_increment || sc.not_null),
        })
        .collect();
    Table::new(name, columns)
}
