use common::types::CanonicalSchema;

/// Renders the schema as a markdown document with one table per schema table.
pub fn format_schema_markdown(schema: &CanonicalSchema) -> String {
    let mut lines = vec!["# Database Schema\n".to_string()];

    for table in &schema.tables {
        lines.push(format!("## Table: `{}`\n", table.name));
        lines.push("| Column Name | Data Type | Constraints |".to_string());
        lines.push("|-------------|-----------|-------------|".to_string());

        for column in &table.columns {
            let mut constraints = Vec::new();
            if column.primary_key {
                constraints.push("PK".to_string());
            }
            if let Some(fk) = &column.foreign_key {
                constraints.push(format!("FK → {}.{}", fk.table, fk.column));
            }
            if column.unique {
                constraints.push("Unique".to_string());
            }
            if let Some(default) = &column.default {
                constraints.push(format!("Default: {default}"));
            }
            lines.push(format!(
                "| `{}` | `{}` | {} |",
                column.name,
                column.data_type,
                constraints.join(", ")
            ));
        }

        lines.push("\n".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{Column, DefaultValue, Table};

    #[test]
    fn renders_constraints_column() {
        let schema = CanonicalSchema::new(vec![Table::new(
            "orders",
            vec![
                Column::new("id", "INT").primary_key(),
                Column::new("user_id", "INT").references("users", "id").unique(),
                Column::new("status", "VARCHAR(20)")
                    .default_value(DefaultValue::Text("new".into())),
            ],
        )]);

        let markdown = format_schema_markdown(&schema);
        assert!(markdown.starts_with("# Database Schema\n\n## Table: `orders`\n\n"));
        assert!(markdown.contains("| `id` | `INT` | PK |"));
        assert!(markdown.contains("| `user_id` | `INT` | FK → users.id, Unique |"));
        assert!(markdown.contains("| `status` | `VARCHAR(20)` | Default: new |"));
    }
}
