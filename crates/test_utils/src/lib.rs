use async_trait::async_trait;
use common::types::{CanonicalSchema, Column, ConnectionConfig, DatabaseKind, DefaultValue, Table};
use parking_lot::Mutex;
use shared_clients::{GenerationRequest, LanguageModel, ModelError};
use std::collections::VecDeque;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use uuid::Uuid;

/// In-memory [`LanguageModel`] that replays queued replies in order and
/// records every request it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    unavailable: bool,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(reply.into()));
        self
    }

    /// Queues a failure; it surfaces as a timeout.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Err(message.into()));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        self.requests.lock().push(request);
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ModelError::timeout(message)),
            None => Err(ModelError::invalid_response("no scripted reply left")),
        }
    }

    async fn is_available(&self, _model_id: &str) -> bool {
        !self.unavailable
    }
}

/// `users` and `posts`, with a foreign key from posts to users.
pub fn blog_schema() -> CanonicalSchema {
    CanonicalSchema::new(vec![
        Table::new(
            "users",
            vec![
                Column::new("id", "INT").primary_key(),
                Column::new("email", "VARCHAR(255)").unique(),
                Column::new("is_admin", "BOOLEAN")
                    .default_value(DefaultValue::Bool(false)),
                Column::new("created_at", "TIMESTAMP")
                    .default_value(DefaultValue::Text("CURRENT_TIMESTAMP".into())),
            ],
        ),
        Table::new(
            "posts",
            vec![
                Column::new("id", "INT").primary_key(),
                Column::new("user_id", "INT").references("users", "id"),
                Column::new("body", "TEXT").nullable(),
            ],
        ),
    ])
}

pub fn blog_schema_json() -> serde_json::Value {
    serde_json::to_value(blog_schema()).unwrap_or_default()
}

pub const PG_DB: &str = "postgres";
pub const PG_USER: &str = "postgres";
pub const PG_PASSWORD: &str = "postgres";
pub const PG_HOST: &str = "127.0.0.1";

pub struct PgTestContainer {
    pub container: ContainerAsync<GenericImage>,
    pub port: u16,
    pub db_name: &'static str,
    pub user: &'static str,
    pub password: &'static str,
    pub host: &'static str,
}

impl PgTestContainer {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(
            DatabaseKind::Postgres,
            self.host,
            self.user,
            self.password,
            self.db_name,
        )
        .with_port(self.port)
    }
}

pub async fn setup_postgres() -> Result<PgTestContainer, Box<dyn std::error::Error>> {
    let name = format!("schemaforge-postgres-{}", Uuid::new_v4());
    let postgres = GenericImage::new("postgres", "16")
        .with_wait_for(WaitFor::message_on_stdout(
            "database system is ready to accept connections",
        ))
        .with_container_name(&name)
        .with_env_var("POSTGRES_DB", PG_DB)
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASSWORD)
        .with_mapped_port(0, 5432u16.tcp())
        .start()
        .await?;

    let port = postgres.get_host_port_ipv4(5432).await?;

    Ok(PgTestContainer {
        container: postgres,
        port,
        db_name: PG_DB,
        user: PG_USER,
        password: PG_PASSWORD,
        host: PG_HOST,
    })
}
