use common::error::{DiagnosticMessage, ForgeError};
use shared_clients::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("no conversation: {context}")]
    NoActiveConversation { context: DiagnosticMessage },
    #[error("explanation failed: {context}")]
    Model {
        context: DiagnosticMessage,
        #[source]
        source: ModelError,
    },
}

impl ConversationError {
    #[track_caller]
    pub fn no_active_conversation() -> Self {
        Self::NoActiveConversation {
            context: DiagnosticMessage::new("No active conversation found and no query provided"),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NoActiveConversation { context } | Self::Model { context, .. } => {
                context.message()
            }
        }
    }
}

impl From<ModelError> for ConversationError {
    #[track_caller]
    fn from(source: ModelError) -> Self {
        Self::Model {
            context: DiagnosticMessage::new(source.message().to_string()),
            source,
        }
    }
}

impl From<ConversationError> for ForgeError {
    #[track_caller]
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NoActiveConversation { context } => {
                ForgeError::input(context.message().to_string())
            }
            ConversationError::Model { source, .. } => source.into(),
        }
    }
}
