use crate::statement::{
    create_table_sql, insert_statement, insertable_records, query_kind, returns_rows, Placeholder,
};
use crate::{AdapterError, DatabaseBackend, ExecutionOutcome, Row};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::types::{
    CanonicalSchema, Column, ConnectionConfig, DatabaseKind, DefaultValue, Dialect, ForeignKey,
    Record, SimplifiedColumn, SqlValue, Table,
};
use logging::timeit;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as _, Connection, MySql, MySqlConnection, Row as _, TypeInfo};
use tracing::{info, warn};

// MySQL 8 reports information_schema text as binary; cast so it decodes as String.
const LIST_TABLES: &str = "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
     WHERE table_schema = DATABASE() ORDER BY table_name";

const BASE_TABLES: &str = "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name";

const TABLE_COLUMNS: &str = "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR), \
     CAST(is_nullable AS CHAR), CAST(column_key AS CHAR), CAST(column_default AS CHAR) \
     FROM information_schema.columns \
     WHERE table_schema = DATABASE() AND table_name = ? \
     ORDER BY ordinal_position";

const FOREIGN_KEYS: &str = "SELECT CAST(column_name AS CHAR), \
     CAST(referenced_table_name AS CHAR), CAST(referenced_column_name AS CHAR) \
     FROM information_schema.key_column_usage \
     WHERE table_schema = DATABASE() AND table_name = ? \
       AND referenced_table_name IS NOT NULL";

/// Backend for MySQL and MariaDB.
pub struct MySqlBackend {
    config: ConnectionConfig,
}

impl MySqlBackend {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<MySqlConnection, AdapterError> {
        let mut options = MySqlConnectOptions::new()
            .host(self.config.host())
            .port(self.config.port_or_default())
            .username(&self.config.user)
            .password(&self.config.password);
        if !self.config.database.is_empty() {
            options = options.database(&self.config.database);
        }
        MySqlConnection::connect_with(&options)
            .await
            .map_err(AdapterError::connection)
    }

    async fn describe_table(
        &self,
        conn: &mut MySqlConnection,
        table: &str,
    ) -> Result<Table, AdapterError> {
        let foreign: Vec<(String, String, String)> = sqlx::query_as(FOREIGN_KEYS)
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;

        let rows: Vec<(String, String, String, Option<String>, Option<String>)> =
            sqlx::query_as(TABLE_COLUMNS)
                .bind(table)
                .fetch_all(&mut *conn)
                .await?;

        let columns = rows
            .into_iter()
            .map(|(name, data_type, nullable, key, default)| {
                let key = key.unwrap_or_default();
                let foreign_key = foreign
                    .iter()
                    .find(|(column, _, _)| *column == name)
                    .map(|(_, table, column)| ForeignKey {
                        table: table.clone(),
                        column: column.clone(),
                    });
                Column {
                    name,
                    data_type,
                    primary_key: key == "PRI",
                    foreign_key,
                    unique: key == "UNI",
                    default: default.map(DefaultValue::Text),
                    nullable: nullable == "YES",
                }
            })
            .collect();
        Ok(Table::new(table, columns))
    }
}

#[async_trait]
impl DatabaseBackend for MySqlBackend {
    fn kind(&self) -> DatabaseKind {
        self.config.kind
    }

    async fn test_connection(&self) -> Result<(), AdapterError> {
        let conn = self.connect().await?;
        conn.close().await?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError> {
        let mut conn = self.connect().await?;
        let tables: Vec<String> = sqlx::query_scalar(LIST_TABLES)
            .fetch_all(&mut conn)
            .await?;
        conn.close().await?;
        Ok(tables)
    }

    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError> {
        let mut conn = self.connect().await?;
        let names: Vec<String> = sqlx::query_scalar(BASE_TABLES)
            .fetch_all(&mut conn)
            .await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.describe_table(&mut conn, &name).await?);
        }
        conn.close().await?;
        Ok(CanonicalSchema::new(tables))
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome, AdapterError> {
        let mut conn = self.connect().await?;
        let kind = query_kind(sql);
        let outcome = if returns_rows(&kind) {
            let rows = timeit!("mysql select", sqlx::query(sql).fetch_all(&mut conn).await)?;
            ExecutionOutcome::rows(kind, rows.iter().map(decode_row).collect())
        } else {
            let done = sqlx::query(sql).execute(&mut conn).await?;
            ExecutionOutcome::affected(kind, done.rows_affected())
        };
        conn.close().await?;
        Ok(outcome)
    }

    async fn create_table(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError> {
        let mut conn = self.connect().await?;
        let sql = create_table_sql(Dialect::MySql, table, columns);
        info!(table, "creating mysql table");
        sqlx::query(&sql).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError> {
        let mut conn = self.connect().await?;
        let mut inserted = 0;
        for record in insertable_records(columns, records) {
            let sql = insert_statement(Dialect::MySql, Placeholder::Question, table, &record);
            let query = record
                .values()
                .fold(sqlx::query(&sql), |query, value| bind_value(query, value));
            match query.execute(&mut conn).await {
                Ok(_) => inserted += 1,
                Err(err) => warn!(table, error = %err, "skipping record that failed to insert"),
            }
        }
        conn.close().await?;
        Ok(inserted)
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Text(s) => query.bind(s.clone()),
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let idx = column.ordinal();
            let boolean = column.type_info().name() == "BOOLEAN";
            (column.name().to_string(), decode_cell(row, idx, boolean))
        })
        .collect()
}

/// Tries the common Rust types in turn; the first one that decodes wins.
fn decode_cell(row: &MySqlRow, idx: usize, boolean: bool) -> Value {
    if boolean {
        if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            return v.map_or(Value::Null, Value::Bool);
        }
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v.map_or(Value::Null, |v| Value::String(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map_or(Value::Null, |v| Value::String(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v.map_or(Value::Null, |v| Value::String(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map_or(Value::Null, Value::String);
    }
    // DECIMAL and binary-flagged text fall through to here.
    row.try_get_unchecked::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map_or(Value::Null, |text| {
            text.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map_or(Value::String(text), Value::from)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::SimpleType;

    fn unreachable() -> MySqlBackend {
        MySqlBackend::new(
            ConnectionConfig::new(DatabaseKind::MySql, "127.0.0.1", "root", "", "app").with_port(1),
        )
    }

    #[tokio::test]
    async fn statements_fail_at_connect_when_server_is_down() {
        let backend = unreachable();
        assert!(matches!(
            backend.execute("DELETE FROM people").await,
            Err(AdapterError::Connection { .. })
        ));
        assert!(matches!(
            backend.execute("SELECT 1").await,
            Err(AdapterError::Connection { .. })
        ));

        let columns = [SimplifiedColumn::new("id", SimpleType::Int).auto_increment()];
        assert!(matches!(
            backend.create_table("people", &columns).await,
            Err(AdapterError::Connection { .. })
        ));
    }

    #[test]
    fn create_table_statement_targets_mysql() {
        let columns = [
            SimplifiedColumn::new("id", SimpleType::Int).auto_increment(),
            SimplifiedColumn::new("name", SimpleType::String),
        ];
        let sql = create_table_sql(Dialect::MySql, "people", &columns);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `people` ("));
        assert!(sql.contains("AUTO_INCREMENT"));
    }
}
