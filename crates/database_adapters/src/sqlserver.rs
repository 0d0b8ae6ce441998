use crate::statement::{
    create_table_sql, insert_statement, insertable_records, query_kind, returns_rows, Placeholder,
};
use crate::{AdapterError, DatabaseBackend, ExecutionOutcome, Row};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::types::{
    CanonicalSchema, Column, ConnectionConfig, DatabaseKind, DefaultValue, Dialect, Record,
    SimplifiedColumn, SqlValue, Table,
};
use serde_json::Value;
use std::collections::HashSet;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{info, warn};

type SqlServerClient = Client<Compat<TcpStream>>;

const BASE_TABLES: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";

const TABLE_COLUMNS: &str = "SELECT COLUMN_NAME, \
     CASE WHEN CHARACTER_MAXIMUM_LENGTH IS NOT NULL \
       THEN DATA_TYPE + '(' + CAST(CHARACTER_MAXIMUM_LENGTH AS VARCHAR(16)) + ')' \
       ELSE DATA_TYPE END, \
     IS_NULLABLE, COLUMN_DEFAULT \
     FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = @P1 \
     ORDER BY ORDINAL_POSITION";

const PRIMARY_KEYS: &str = "SELECT kcu.COLUMN_NAME \
     FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
     JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
     WHERE tc.TABLE_NAME = @P1 AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY'";

pub struct SqlServerBackend {
    config: ConnectionConfig,
}

impl SqlServerBackend {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<SqlServerClient, AdapterError> {
        let mut config = Config::new();
        config.host(self.config.host());
        config.port(self.config.port_or_default());
        if !self.config.database.is_empty() {
            config.database(&self.config.database);
        }
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));
        config.trust_cert();

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(AdapterError::connection)?;
        tcp.set_nodelay(true).map_err(AdapterError::connection)?;
        Client::connect(config, tcp.compat_write())
            .await
            .map_err(AdapterError::connection)
    }

    async fn select_strings(
        &self,
        client: &mut SqlServerClient,
        sql: &str,
        table: &str,
    ) -> Result<Vec<tiberius::Row>, AdapterError> {
        let mut query = Query::new(sql);
        query.bind(table);
        Ok(query.query(client).await?.into_first_result().await?)
    }

    async fn describe_table(
        &self,
        client: &mut SqlServerClient,
        table: &str,
    ) -> Result<Table, AdapterError> {
        let primary: HashSet<String> = self
            .select_strings(client, PRIMARY_KEYS, table)
            .await?
            .iter()
            .filter_map(|row| text(row, 0))
            .collect();

        let columns = self
            .select_strings(client, TABLE_COLUMNS, table)
            .await?
            .iter()
            .map(|row| {
                let name = text(row, 0).unwrap_or_default();
                Column {
                    data_type: text(row, 1).unwrap_or_default(),
                    primary_key: primary.contains(&name),
                    foreign_key: None,
                    unique: false,
                    default: text(row, 3).map(DefaultValue::Text),
                    nullable: text(row, 2).as_deref() == Some("YES"),
                    name,
                }
            })
            .collect();
        Ok(Table::new(table, columns))
    }
}

#[async_trait]
impl DatabaseBackend for SqlServerBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::SqlServer
    }

    async fn test_connection(&self) -> Result<(), AdapterError> {
        let client = self.connect().await?;
        client.close().await?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError> {
        let mut client = self.connect().await?;
        let rows = client
            .simple_query(BASE_TABLES)
            .await?
            .into_first_result()
            .await?;
        let tables = rows
            .iter()
            .filter_map(|row| text(row, 0))
            .collect();
        client.close().await?;
        Ok(tables)
    }

    /// Foreign keys are not reported for SQL Server.
    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError> {
        let mut client = self.connect().await?;
        let names: Vec<String> = client
            .simple_query(BASE_TABLES)
            .await?
            .into_first_result()
            .await?
            .iter()
            .filter_map(|row| text(row, 0))
            .collect();
        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            tables.push(self.describe_table(&mut client, name).await?);
        }
        client.close().await?;
        Ok(CanonicalSchema::new(tables))
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome, AdapterError> {
        let mut client = self.connect().await?;
        let kind = query_kind(sql);
        let outcome = if returns_rows(&kind) {
            let rows = client.simple_query(sql).await?.into_first_result().await?;
            ExecutionOutcome::rows(kind, rows.iter().map(decode_row).collect())
        } else {
            let done = client.execute(sql, &[]).await?;
            ExecutionOutcome::affected(kind, done.total())
        };
        client.close().await?;
        Ok(outcome)
    }

    async fn create_table(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError> {
        let mut client = self.connect().await?;
        let sql = create_table_sql(Dialect::SqlServer, table, columns);
        info!(table, "creating sql server table");
        client.simple_query(sql).await?.into_results().await?;
        client.close().await?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError> {
        let mut client = self.connect().await?;
        let mut inserted = 0;
        for record in insertable_records(columns, records) {
            let sql = insert_statement(Dialect::SqlServer, Placeholder::AtP, table, &record);
            let mut query = Query::new(sql);
            for value in record.values() {
                match value {
                    SqlValue::Null => query.bind(Option::<String>::None),
                    SqlValue::Int(i) => query.bind(*i),
                    SqlValue::Float(f) => query.bind(*f),
                    SqlValue::Bool(b) => query.bind(*b),
                    SqlValue::Text(s) => query.bind(s.clone()),
                }
            }
            match query.execute(&mut client).await {
                Ok(_) => inserted += 1,
                Err(err) => warn!(table, error = %err, "skipping record that failed to insert"),
            }
        }
        client.close().await?;
        Ok(inserted)
    }
}

fn text(row: &tiberius::Row, idx: usize) -> Option<String> {
    row.try_get::<&str, _>(idx).ok().flatten().map(str::to_string)
}

fn decode_row(row: &tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names
        .into_iter()
        .zip(row.cells().map(|(_, data)| decode_cell(data)))
        .collect()
}

fn temporal<'a, T>(data: &'a ColumnData<'static>, render: impl Fn(T) -> String) -> Value
where
    T: FromSql<'a>,
{
    match T::from_sql(data) {
        Ok(Some(value)) => Value::String(render(value)),
        _ => Value::Null,
    }
}

fn decode_cell(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I16(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I32(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I64(v) => v.map_or(Value::Null, Value::from),
        ColumnData::F32(v) => v.map_or(Value::Null, Value::from),
        ColumnData::F64(v) => v.map_or(Value::Null, Value::from),
        ColumnData::Bit(v) => v.map_or(Value::Null, Value::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(Value::Null, |s| Value::String(s.to_string())),
        ColumnData::Guid(v) => v.map_or(Value::Null, |g| Value::String(g.to_string())),
        ColumnData::Numeric(v) => v.map_or(Value::Null, |n| {
            let scaled = n.value() as f64 / 10f64.powi(i32::from(n.scale()));
            Value::from(scaled)
        }),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal(data, |v: NaiveDateTime| v.to_string())
        }
        ColumnData::Date(_) => temporal(data, |v: NaiveDate| v.to_string()),
        ColumnData::Time(_) => temporal(data, |v: NaiveTime| v.to_string()),
        ColumnData::DateTimeOffset(_) => temporal(data, |v: DateTime<Utc>| v.to_rfc3339()),
        ColumnData::Binary(_) | ColumnData::Xml(_) => Value::Null,
    }
}
