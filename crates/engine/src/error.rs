use common::error::{DiagnosticMessage, ForgeError};
use database_adapters::AdapterError;
use shared_clients::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {context}")]
    InvalidInput { context: DiagnosticMessage },
    #[error("could not use model output: {context}")]
    Extraction {
        context: DiagnosticMessage,
        raw_output: String,
    },
    #[error("model call failed: {context}")]
    Model {
        context: DiagnosticMessage,
        #[source]
        source: ModelError,
    },
    #[error("database call failed: {context}")]
    Backend {
        context: DiagnosticMessage,
        #[source]
        source: AdapterError,
    },
}

impl EngineError {
    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn extraction(message: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self::Extraction {
            context: DiagnosticMessage::new(message.into()),
            raw_output: raw_output.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { context }
            | Self::Extraction { context, .. }
            | Self::Model { context, .. }
            | Self::Backend { context, .. } => context.message(),
        }
    }
}

impl From<ModelError> for EngineError {
    #[track_caller]
    fn from(source: ModelError) -> Self {
        Self::Model {
            context: DiagnosticMessage::new(source.message().to_string()),
            source,
        }
    }
}

impl From<AdapterError> for EngineError {
    #[track_caller]
    fn from(source: AdapterError) -> Self {
        Self::Backend {
            context: DiagnosticMessage::new(source.message().to_string()),
            source,
        }
    }
}

impl From<EngineError> for ForgeError {
    #[track_caller]
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput { context } => ForgeError::input(context.message().to_string()),
            EngineError::Extraction {
                context,
                raw_output,
            } => ForgeError::extraction(context.message().to_string(), raw_output),
            EngineError::Model { source, .. } => source.into(),
            EngineError::Backend { source, .. } => source.into(),
        }
    }
}
