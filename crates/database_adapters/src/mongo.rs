use crate::{AdapterError, DatabaseBackend, ExecutionOutcome};
use async_trait::async_trait;
use common::types::{CanonicalSchema, ConnectionConfig, DatabaseKind, Record, SimplifiedColumn};
use mongodb::bson::{self, Document};
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;
use std::time::Duration;
use tracing::{debug, info};

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Document store backend. Only the operations that make sense without SQL
/// are supported; collections are created implicitly on first insert.
pub struct MongoBackend {
    config: ConnectionConfig,
}

impl MongoBackend {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Client, AdapterError> {
        let credential = (!self.config.user.is_empty()).then(|| {
            Credential::builder()
                .username(self.config.user.clone())
                .password(self.config.password.clone())
                .build()
        });
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: self.config.host().to_string(),
                port: Some(self.config.port_or_default()),
            }])
            .credential(credential)
            .server_selection_timeout(SERVER_SELECTION_TIMEOUT)
            .build();
        Client::with_options(options).map_err(AdapterError::connection)
    }

    fn database_name(&self) -> Option<&str> {
        (!self.config.database.is_empty()).then_some(self.config.database.as_str())
    }
}

#[async_trait]
impl DatabaseBackend for MongoBackend {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MongoDb
    }

    async fn test_connection(&self) -> Result<(), AdapterError> {
        let client = self.connect()?;
        let names = client
            .list_database_names(None, None)
            .await
            .map_err(AdapterError::connection)?;
        debug!(databases = names.len(), "mongodb reachable");
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, AdapterError> {
        let Some(db) = self.database_name() else {
            return Ok(Vec::new());
        };
        let client = self.connect()?;
        Ok(client.database(db).list_collection_names(None).await?)
    }

    async fn introspect_schema(&self) -> Result<CanonicalSchema, AdapterError> {
        Err(AdapterError::unsupported(
            "Schema introspection not supported for MongoDB",
        ))
    }

    async fn execute(&self, _sql: &str) -> Result<ExecutionOutcome, AdapterError> {
        Err(AdapterError::unsupported(
            "Direct SQL execution not supported for MongoDB",
        ))
    }

    async fn create_table(
        &self,
        table: &str,
        _columns: &[SimplifiedColumn],
    ) -> Result<(), AdapterError> {
        debug!(collection = table, "mongodb collections are created on first insert");
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &str,
        _columns: &[SimplifiedColumn],
        records: &[Record],
    ) -> Result<usize, AdapterError> {
        if records.is_empty() {
            return Ok(0);
        }
        let db = self
            .database_name()
            .ok_or_else(|| AdapterError::invalid_input("MongoDB inserts require a database name"))?;

        let documents = records
            .iter()
            .map(|record| bson::to_document(&record.to_json_object()))
            .collect::<Result<Vec<Document>, _>>()
            .map_err(AdapterError::invalid_input_from)?;

        let client = self.connect()?;
        let result = client
            .database(db)
            .collection::<Document>(table)
            .insert_many(documents, None)
            .await?;
        info!(collection = table, inserted = result.inserted_ids.len(), "inserted documents");
        Ok(result.inserted_ids.len())
    }
}
