pub mod error;
pub mod mongo;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;
pub mod statement;

pub use error::AdapterError;

use crate::mongo::MongoBackend;
use crate::mysql::MySqlBackend;
use crate::postgres::PostgresBackend;
use crate::sqlite::SqliteBackend;
use crate::sqlserver::SqlServerBackend;
use async_trait::async_trait;
use common::types::{CanonicalSchema, ConnectionConfig, DatabaseKind, Record, SimplifiedColumn};
use serde::Serialize;
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

/// Result of running an arbitrary statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    /// Leading keyword of the statement, upper-cased.
    pub query_kind: String,
    pub payload: QueryPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPayload {
    Rows(Vec<Row>),
    Affected(u64),
}

impl ExecutionOutcome {
    pub fn rows(query_kind: String, rows: Vec<Row>) -> Self {
        Self {
            query_kind,
            payload: QueryPayload::Rows(rows),
        }
    }

    pub fn affected(query_kind: String, count: u64) -> Self {
        Self {
            query_kind,
            payload: QueryPayload::Affected(count),
        }
    }
}

/// Uniform contract over every supported engine. Each call opens its own
/// connection and closes it before returning.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    async fn test_connection(&self) -> Result<(), AdapterError>;

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError>;

    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError>;

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome, AdapterError>;

    async fn create_table(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError>;

    /// Inserts `records` row by row; rows the engine rejects are logged and
    /// skipped. Returns the number of rows actually inserted.
    async fn insert_rows(
        &self,
        table: &str,
        columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError>;
}

pub type DynBackend = Box<dyn DatabaseBackend>;

pub fn create_backend(config: &ConnectionConfig) -> DynBackend {
    match config.kind {
        DatabaseKind::MySql | DatabaseKind::MariaDb => Box::new(MySqlBackend::new(config.clone())),
        DatabaseKind::Postgres => Box::new(PostgresBackend::new(config.clone())),
        DatabaseKind::Sqlite => Box::new(SqliteBackend::new(config.clone())),
        DatabaseKind::SqlServer => Box::new(SqlServerBackend::new(config.clone())),
        DatabaseKind::MongoDb => Box::new(MongoBackend::new(config.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_backend_by_kind() {
        let cases = [
            (DatabaseKind::MariaDb, DatabaseKind::MariaDb),
            (DatabaseKind::Postgres, DatabaseKind::Postgres),
            (DatabaseKind::Sqlite, DatabaseKind::Sqlite),
            (DatabaseKind::SqlServer, DatabaseKind::SqlServer),
            (DatabaseKind::MongoDb, DatabaseKind::MongoDb),
        ];
        for (kind, expected) in cases {
            let config = ConnectionConfig::new(kind, "localhost", "u", "p", "db");
            assert_eq!(create_backend(&config).kind(), expected);
        }
    }

    #[test]
    fn outcome_serializes_payload() {
        let outcome = ExecutionOutcome::affected("DELETE".into(), 3);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["payload"]["affected"], 3);
    }
}
