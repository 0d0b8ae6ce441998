use crate::statement::{
    bool_param, create_table_sql, float_param, insert_statement, insertable_records, int_param,
    query_kind, returns_rows, text_param, Placeholder,
};
use crate::{AdapterError, DatabaseBackend, ExecutionOutcome, Row};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::types::{
    CanonicalSchema, Column, ConnectionConfig, DatabaseKind, DefaultValue, Dialect, ForeignKey,
    Record, SimplifiedColumn, SqlValue, Table,
};
use logging::timeit;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as StdError;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::{error, info, warn};
use uuid::Uuid;

const LIST_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' ORDER BY table_name";

const BASE_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

const TABLE_COLUMNS: &str = "SELECT column_name::text, \
     (CASE WHEN character_maximum_length IS NOT NULL \
        THEN data_type || '(' || character_maximum_length || ')' \
        ELSE data_type END)::text, \
     is_nullable::text, column_default::text \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 \
     ORDER BY ordinal_position";

const KEY_CONSTRAINTS: &str = "SELECT kcu.column_name::text, tc.constraint_type::text \
     FROM information_schema.table_constraints AS tc \
     JOIN information_schema.key_column_usage AS kcu \
       ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
     WHERE tc.table_schema = 'public' AND tc.table_name = $1 \
       AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')";

const FOREIGN_KEYS: &str = "SELECT kcu.column_name::text, ccu.table_name::text, ccu.column_name::text \
     FROM information_schema.table_constraints AS tc \
     JOIN information_schema.key_column_usage AS kcu \
       ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
     JOIN information_schema.constraint_column_usage AS ccu \
       ON ccu.constraint_name = tc.constraint_name AND ccu.table_schema = tc.table_schema \
     WHERE tc.table_schema = 'public' AND tc.table_name = $1 \
       AND tc.constraint_type = 'FOREIGN KEY'";

pub struct PostgresBackend {
    config: ConnectionConfig,
}

impl PostgresBackend {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connects and spawns the connection driver; the driver exits once the
    /// returned client is dropped.
    async fn connect(&self) -> Result<Client, AdapterError> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(self.config.host())
            .port(self.config.port_or_default())
            .user(self.config.user.as_str())
            .password(self.config.password.as_str());
        if !self.config.database.is_empty() {
            pg.dbname(self.config.database.as_str());
        }

        let (client, connection) = pg.connect(NoTls).await.map_err(AdapterError::connection)?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "postgres connection driver exited");
            }
        });
        Ok(client)
    }

    async fn describe_table(&self, client: &Client, table: &str) -> Result<Table, AdapterError> {
        let mut keys: HashMap<String, Vec<String>> = HashMap::new();
        for row in client.query(KEY_CONSTRAINTS, &[&table]).await? {
            let column: String = row.try_get(0)?;
            let kind: String = row.try_get(1)?;
            keys.entry(column).or_default().push(kind);
        }

        let mut foreign: HashMap<String, ForeignKey> = HashMap::new();
        for row in client.query(FOREIGN_KEYS, &[&table]).await? {
            let column: String = row.try_get(0)?;
            foreign.entry(column).or_insert(ForeignKey {
                table: row.try_get(1)?,
                column: row.try_get(2)?,
            });
        }

        let mut columns = Vec::new();
        for row in client.query(TABLE_COLUMNS, &[&table]).await? {
            let name: String = row.try_get(0)?;
            let nullable: String = row.try_get(2)?;
            let default: Option<String> = row.try_get(3)?;
            let constraints = keys.get(&name);
            let has = |kind: &str| constraints.is_some_and(|k| k.iter().any(|c| c == kind));

            columns.push(Column {
                data_type: row.try_get(1)?,
                primary_key: has("PRIMARY KEY"),
                foreign_key: foreign.remove(&name),
                unique: has("UNIQUE"),
                default: default.map(DefaultValue::Text),
                nullable: nullable == "YES",
                name,
            });
        }
        Ok(Table::new(table, columns))
    }

    async fn insert_one(
        &self,
        client: &Client,
        table: &str,
        record: &Record,
    ) -> Result<u64, AdapterError> {
        let sql = insert_statement(Dialect::Postgres, Placeholder::Dollar, table, record);
        let statement = client.prepare(&sql).await?;
        let params = statement
            .params()
            .iter()
            .zip(record.values())
            .map(|(ty, value)| pg_param(value, ty))
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        Ok(client.execute(&statement, &refs).await?)
    }
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    async fn test_connection(&self) -> Result<(), AdapterError> {
        let client = self.connect().await?;
        drop(client);
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError> {
        let client = self.connect().await?;
        client
            .query(LIST_TABLES, &[])
            .await?
            .iter()
            .map(|row| row.try_get::<_, String>(0).map_err(AdapterError::from))
            .collect()
    }

    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError> {
        let client = self.connect().await?;
        let mut tables = Vec::new();
        for row in client.query(BASE_TABLES, &[]).await? {
            let name: String = row.try_get(0)?;
            tables.push(self.describe_table(&client, &name).await?);
        }
        Ok(CanonicalSchema::new(tables))
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome, AdapterError> {
        let client = self.connect().await?;
        let kind = query_kind(sql);
        if !returns_rows(&kind) {
            let affected = client.execute(sql, &[]).await?;
            return Ok(ExecutionOutcome::affected(kind, affected));
        }

        let rows = timeit!("postgres select", client.query(sql, &[]).await)?;
        let mut decoded = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut object = Row::new();
            for (idx, column) in row.columns().iter().enumerate() {
                let PgCell(value) = row.try_get(idx)?;
                object.insert(column.name().to_string(), value);
            }
            decoded.push(object);
        }
        Ok(ExecutionOutcome::rows(kind, decoded))
    }

    async fn create_table(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError> {
        let client = self.connect().await?;
        let sql = create_table_sql(Dialect::Postgres, table, columns);
        info!(table, "creating postgres table");
        client.batch_execute(&sql).await?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError> {
        let client = self.connect().await?;
        let mut inserted = 0;
        for record in insertable_records(columns, records) {
            match self.insert_one(&client, table, &record).await {
                Ok(_) => inserted += 1,
                Err(err) => warn!(table, error = %err, "skipping record that failed to insert"),
            }
        }
        Ok(inserted)
    }
}

type PgParam = Box<dyn ToSql + Sync + Send>;

fn parse_text<T>(value: &SqlValue, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, AdapterError> {
    match text_param(value) {
        None => Ok(None),
        Some(text) => parse(&text)
            .map(Some)
            .ok_or_else(|| AdapterError::invalid_input(format!("cannot parse '{text}'"))),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Converts a record value to the Rust type the prepared statement expects.
fn pg_param(value: &SqlValue, ty: &Type) -> Result<PgParam, AdapterError> {
    let param: PgParam = match ty.name() {
        "int2" => Box::new(
            int_param(value)?
                .map(i16::try_from)
                .transpose()
                .map_err(AdapterError::invalid_input_from)?,
        ),
        "int4" => Box::new(
            int_param(value)?
                .map(i32::try_from)
                .transpose()
                .map_err(AdapterError::invalid_input_from)?,
        ),
        "int8" => Box::new(int_param(value)?),
        "float4" => Box::new(float_param(value)?.map(|f| f as f32)),
        "float8" => Box::new(float_param(value)?),
        "bool" => Box::new(bool_param(value)?),
        "date" => Box::new(parse_text(value, |s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
        })?),
        "timestamp" => Box::new(parse_text(value, parse_timestamp)?),
        "timestamptz" => Box::new(parse_text(value, |s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.and_utc()))
        })?),
        "json" | "jsonb" => Box::new((!value.is_null()).then(|| value.to_json())),
        "text" | "varchar" | "bpchar" | "name" | "citext" => Box::new(text_param(value)),
        other => {
            return Err(AdapterError::invalid_input(format!(
                "unsupported parameter type {other}"
            )))
        }
    };
    Ok(param)
}

/// Any-typed result cell decoded into JSON.
struct PgCell(Value);

impl<'a> FromSql<'a> for PgCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let value = match ty.name() {
            "bool" => Value::Bool(bool::from_sql(ty, raw)?),
            "int2" => Value::from(i16::from_sql(ty, raw)?),
            "int4" => Value::from(i32::from_sql(ty, raw)?),
            "int8" => Value::from(i64::from_sql(ty, raw)?),
            "oid" => Value::from(u32::from_sql(ty, raw)?),
            "float4" => Value::from(f32::from_sql(ty, raw)?),
            "float8" => Value::from(f64::from_sql(ty, raw)?),
            "numeric" => {
                let text = Decimal::from_sql(ty, raw)?.to_string();
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map_or(Value::String(text), Value::from)
            }
            "json" | "jsonb" => Value::from_sql(ty, raw)?,
            "date" => Value::String(NaiveDate::from_sql(ty, raw)?.to_string()),
            "time" => Value::String(NaiveTime::from_sql(ty, raw)?.to_string()),
            "timestamp" => Value::String(NaiveDateTime::from_sql(ty, raw)?.to_string()),
            "timestamptz" => Value::String(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
            "uuid" => Value::String(Uuid::from_sql(ty, raw)?.to_string()),
            _ => std::str::from_utf8(raw)
                .map(|s| Value::String(s.to_string()))
                .unwrap_or(Value::Null),
        };
        Ok(PgCell(value))
    }

    fn from_sql_null(_: &Type) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(PgCell(Value::Null))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: u16, weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        for part in [ndigits, weight as u16, sign, dscale] {
            raw.extend_from_slice(&part.to_be_bytes());
        }
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    fn cell(ty: &Type, raw: &[u8]) -> Value {
        let PgCell(value) = PgCell::from_sql(ty, raw).unwrap();
        value
    }

    #[test]
    fn decodes_numeric_cells() {
        // 12345.678 => groups [1, 2345, 6780], weight 1, scale 3
        let raw = numeric(3, 1, 0, 3, &[1, 2345, 6780]);
        assert_eq!(cell(&Type::NUMERIC, &raw), Value::from(12345.678));

        // -0.05 => groups [500], weight -1, scale 2
        let raw = numeric(1, -1, 0x4000, 2, &[500]);
        assert_eq!(cell(&Type::NUMERIC, &raw), Value::from(-0.05));

        let raw = numeric(1, 0, 0, 0, &[42]);
        assert_eq!(cell(&Type::NUMERIC, &raw), Value::from(42.0));
    }

    #[test]
    fn decodes_uuid_cells() {
        let raw: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            cell(&Type::UUID, &raw),
            Value::from("00010203-0405-0607-0809-0a0b0c0d0e0f")
        );
        assert!(PgCell::from_sql(&Type::UUID, &raw[..4]).is_err());
    }

    #[test]
    fn binds_values_by_parameter_type() {
        assert!(pg_param(&SqlValue::Int(5), &Type::INT4).is_ok());
        assert!(pg_param(&SqlValue::Int(i64::MAX), &Type::INT4).is_err());
        assert!(pg_param(&SqlValue::Text("2025-03-19".into()), &Type::DATE).is_ok());
        assert!(pg_param(&SqlValue::Text("2025-03-19 12:00:00".into()), &Type::TIMESTAMP).is_ok());
        assert!(pg_param(&SqlValue::Text("soon".into()), &Type::DATE).is_err());
        assert!(pg_param(&SqlValue::Null, &Type::BOOL).is_ok());
        assert!(pg_param(&SqlValue::Text("x".into()), &Type::POINT).is_err());
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        assert!(parse_timestamp("2025-03-19 12:00:00").is_some());
        assert!(parse_timestamp("2025-03-19T12:00:00.250").is_some());
        assert!(parse_timestamp("2025-03-19").is_some());
        assert!(parse_timestamp("March 19").is_none());
    }
}
