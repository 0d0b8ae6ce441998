use crate::error::ApiError;
use common::config::ForgeConfig;
use common::error::ForgeError;
use common::types::ConnectionConfig;
use conversation::ConversationStore;
use database_adapters::{create_backend, DynBackend};
use parking_lot::RwLock;
use shared_clients::SharedModel;

pub const NOT_CONNECTED: &str = "Database not connected. Please connect first.";

/// Process-wide state shared by every handler.
pub struct AppState {
    pub config: ForgeConfig,
    pub model: SharedModel,
    pub conversations: ConversationStore,
    connection: RwLock<Option<ConnectionConfig>>,
}

impl AppState {
    pub fn new(config: ForgeConfig, model: SharedModel) -> Self {
        let conversations = ConversationStore::new(config.conversation.max_history);
        Self {
            config,
            model,
            conversations,
            connection: RwLock::new(None),
        }
    }

    /// A copy of the active connection, if any. The lock is released before
    /// the caller does any I/O.
    pub fn connection(&self) -> Option<ConnectionConfig> {
        self.connection.read().clone()
    }

    pub fn set_connection(&self, config: ConnectionConfig) {
        *self.connection.write() = Some(config);
    }

    pub fn clear_connection(&self) {
        *self.connection.write() = None;
    }

    /// Backend for the active connection, or an input error when nothing is
    /// connected.
    pub fn backend(&self) -> Result<(ConnectionConfig, DynBackend), ApiError> {
        let config = self
            .connection()
            .ok_or_else(|| ForgeError::input(NOT_CONNECTED))?;
        let backend = create_backend(&config);
        Ok((config, backend))
    }
}
