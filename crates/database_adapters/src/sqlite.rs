use crate::statement::{
    create_table_sql, insert_statement, insertable_records, query_kind, returns_rows, Placeholder,
};
use crate::{AdapterError, DatabaseBackend, ExecutionOutcome, Row};
use async_trait::async_trait;
use common::types::{
    CanonicalSchema, Column, ConnectionConfig, DatabaseKind, DefaultValue, Dialect, ForeignKey,
    Record, SimplifiedColumn, SqlValue, Table,
};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

/// File-backed SQLite. The database name is the file path; host and
/// credentials are ignored.
pub struct SqliteBackend {
    config: ConnectionConfig,
}

impl SqliteBackend {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    fn path(&self) -> PathBuf {
        PathBuf::from(&self.config.database)
    }

    /// Runs `op` against a fresh connection on the blocking pool.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, AdapterError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, AdapterError> + Send + 'static,
    {
        let path = self.path();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            )
            .map_err(AdapterError::connection)?;
            op(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    async fn test_connection(&self) -> Result<(), AdapterError> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await
    }

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError> {
        self.with_connection(|conn| table_names(conn)).await
    }

    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError> {
        self.with_connection(|conn| {
            let tables = table_names(conn)?
                .iter()
                .map(|name| describe_table(conn, name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CanonicalSchema::new(tables))
        })
        .await
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome, AdapterError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| {
            let kind = query_kind(&sql);
            let mut stmt = conn.prepare(&sql)?;
            if stmt.column_count() == 0 {
                let affected = stmt.execute([])?;
                return Ok(ExecutionOutcome::affected(kind, affected as u64));
            }
            if !returns_rows(&kind) {
                // WITH, PRAGMA and RETURNING statements: run to completion and
                // count the rows they produced.
                let mut rows = stmt.query([])?;
                let mut produced = 0u64;
                while rows.next()?.is_some() {
                    produced += 1;
                }
                return Ok(ExecutionOutcome::affected(kind, produced));
            }

            let names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
            let mut rows = stmt.query([])?;
            let mut decoded = Vec::new();
            while let Some(row) = rows.next()? {
                let mut object = Row::new();
                for (idx, name) in names.iter().enumerate() {
                    object.insert(name.clone(), json_value(row.get_ref(idx)?));
                }
                decoded.push(object);
            }
            Ok(ExecutionOutcome::rows(kind, decoded))
        })
        .await
    }

    async fn create_table(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError> {
        let sql = create_table_sql(Dialect::Sqlite, table, columns);
        info!(table, "creating sqlite table");
        self.with_connection(move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError> {
        let table = table.to_string();
        let records = insertable_records(columns, records);
        self.with_connection(move |conn| {
            let mut inserted = 0;
            for record in &records {
                let sql = insert_statement(Dialect::Sqlite, Placeholder::Question, &table, record);
                let params: Vec<SqliteValue> = record.values().map(sqlite_value).collect();
                match conn.execute(&sql, params_from_iter(params)) {
                    Ok(_) => inserted += 1,
                    Err(err) => {
                        warn!(table = %table, error = %err, "skipping record that failed to insert")
                    }
                }
            }
            Ok(inserted)
        })
        .await
    }
}

fn table_names(conn: &Connection) -> Result<Vec<String>, AdapterError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn describe_table(conn: &Connection, table: &str) -> Result<Table, AdapterError> {
    let quoted = table.replace('"', "\"\"");

    let mut fk_stmt = conn.prepare(&format!("PRAGMA foreign_key_list(\"{quoted}\")"))?;
    let foreign: Vec<(String, ForeignKey)> = fk_stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>("from")?,
                ForeignKey {
                    table: row.get("table")?,
                    column: row.get::<_, Option<String>>("to")?.unwrap_or_default(),
                },
            ))
        })?
        .collect::<Result<_, _>>()?;

    let unique = unique_columns(conn, &quoted)?;

    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{quoted}\")"))?;
    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get("name")?;
            let not_null: i64 = row.get("notnull")?;
            let pk: i64 = row.get("pk")?;
            let default: Option<String> = row.get("dflt_value")?;
            Ok(Column {
                data_type: row.get("type")?,
                primary_key: pk > 0,
                foreign_key: foreign
                    .iter()
                    .find(|(from, _)| *from == name)
                    .map(|(_, fk)| fk.clone()),
                unique: unique.contains(&name),
                default: default.map(DefaultValue::Text),
                nullable: not_null == 0 && pk == 0,
                name,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::new(table, columns))
}

/// Columns covered by a single-column unique index.
fn unique_columns(conn: &Connection, quoted_table: &str) -> Result<Vec<String>, AdapterError> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list(\"{quoted_table}\")"))?;
    let indexes: Vec<(String, bool, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>("name")?,
                row.get::<_, bool>("unique")?,
                row.get::<_, String>("origin")?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    let mut columns = Vec::new();
    for (index, unique, origin) in indexes {
        if !unique || origin == "pk" {
            continue;
        }
        let mut info = conn.prepare(&format!(
            "PRAGMA index_info(\"{}\")",
            index.replace('"', "\"\"")
        ))?;
        let covered: Vec<String> = info
            .query_map([], |row| row.get::<_, String>("name"))?
            .collect::<Result<_, _>>()?;
        if let [single] = covered.as_slice() {
            columns.push(single.clone());
        }
    }
    Ok(columns)
}

fn sqlite_value(value: &SqlValue) -> SqliteValue {
    match value {
        SqlValue::Null => SqliteValue::Null,
        SqlValue::Int(i) => SqliteValue::Integer(*i),
        SqlValue::Float(f) => SqliteValue::Real(*f),
        SqlValue::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        SqlValue::Text(s) => SqliteValue::Text(s.clone()),
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}
