use common::error::{BoxError, DiagnosticMessage, ForgeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("connection failed: {context}")]
    Connection {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
    #[error("statement failed: {context}")]
    Execution {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
    #[error("unsupported operation: {context}")]
    Unsupported { context: DiagnosticMessage },
    #[error("invalid input: {context}")]
    InvalidInput { context: DiagnosticMessage },
}

impl AdapterError {
    #[track_caller]
    pub fn connection(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::Connection {
            context: DiagnosticMessage::new(source.to_string()),
            source: Some(source),
        }
    }

    #[track_caller]
    pub fn execution(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::Execution {
            context: DiagnosticMessage::new(source.to_string()),
            source: Some(source),
        }
    }

    #[track_caller]
    pub fn execution_message(message: impl Into<String>) -> Self {
        Self::Execution {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn invalid_input_from(err: impl std::fmt::Display) -> Self {
        Self::invalid_input(err.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Connection { context, .. }
            | Self::Execution { context, .. }
            | Self::Unsupported { context }
            | Self::InvalidInput { context } => context.message(),
        }
    }
}

impl From<AdapterError> for ForgeError {
    #[track_caller]
    fn from(err: AdapterError) -> Self {
        let message = err.message().to_string();
        match err {
            AdapterError::Connection { source, .. } => match source {
                Some(source) => ForgeError::connection_with(message, source),
                None => ForgeError::connection(message),
            },
            AdapterError::Execution { source, .. } => match source {
                Some(source) => ForgeError::execution_with(message, source),
                None => ForgeError::execution(message),
            },
            AdapterError::Unsupported { .. } | AdapterError::InvalidInput { .. } => {
                ForgeError::input(message)
            }
        }
    }
}

impl From<tokio_postgres::Error> for AdapterError {
    #[track_caller]
    fn from(err: tokio_postgres::Error) -> Self {
        let message = match err.as_db_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        Self::Execution {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}

impl From<sqlx::Error> for AdapterError {
    #[track_caller]
    fn from(err: sqlx::Error) -> Self {
        Self::execution(err)
    }
}

impl From<rusqlite::Error> for AdapterError {
    #[track_caller]
    fn from(err: rusqlite::Error) -> Self {
        Self::execution(err)
    }
}

impl From<tiberius::error::Error> for AdapterError {
    #[track_caller]
    fn from(err: tiberius::error::Error) -> Self {
        Self::execution(err)
    }
}

impl From<mongodb::error::Error> for AdapterError {
    #[track_caller]
    fn from(err: mongodb::error::Error) -> Self {
        Self::execution(err)
    }
}

impl From<tokio::task::JoinError> for AdapterError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> Self {
        Self::execution(err)
    }
}
