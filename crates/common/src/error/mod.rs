pub mod diagnostics;

pub use diagnostics::DiagnosticMessage;

use crate::config::error::ConfigError;
use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Request-level failure taxonomy shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("invalid input: {context}")]
    InputValidation { context: DiagnosticMessage },
    #[error("extraction failed: {context}")]
    Extraction {
        context: DiagnosticMessage,
        raw_output: String,
    },
    #[error("connection failed: {context}")]
    Connection {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
    #[error("execution failed: {context}")]
    Execution {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
    #[error("unsupported dialect: {context}")]
    UnsupportedDialect { context: DiagnosticMessage },
    #[error("model failure: {context}")]
    Model {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
    #[error("configuration error: {context}")]
    Config {
        context: DiagnosticMessage,
        #[source]
        source: Option<BoxError>,
    },
}

impl ForgeError {
    #[track_caller]
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputValidation {
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

    #[track_caller]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn connection_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            context: DiagnosticMessage::new(message.into()),
            source: Some(source.into()),
        }
    }

    #[track_caller]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn execution_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Execution {
            context: DiagnosticMessage::new(message.into()),
            source: Some(source.into()),
        }
    }

    #[track_caller]
    pub fn unsupported_dialect(name: impl AsRef<str>) -> Self {
        Self::UnsupportedDialect {
            context: DiagnosticMessage::new(format!(
                "Unsupported database type: {}",
                name.as_ref()
            )),
        }
    }

    #[track_caller]
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn model_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Model {
            context: DiagnosticMessage::new(message.into()),
            source: Some(source.into()),
        }
    }

    pub fn context(&self) -> &DiagnosticMessage {
        match self {
            Self::InputValidation { context }
            | Self::Extraction { context, .. }
            | Self::Connection { context, .. }
            | Self::Execution { context, .. }
            | Self::UnsupportedDialect { context }
            | Self::Model { context, .. }
            | Self::Config { context, .. } => context,
        }
    }

    /// Client-facing text, without the source location.
    pub fn message(&self) -> &str {
        self.context().message()
    }

    /// The model output that failed to parse, if this is an extraction failure.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Extraction { raw_output, .. } => Some(raw_output.as_str()),
            _ => None,
        }
    }
}

impl From<ConfigError> for ForgeError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        Self::Config {
            context: DiagnosticMessage::new(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for ForgeError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::InputValidation {
            context: DiagnosticMessage::new(format!("malformed JSON: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_strips_location() {
        let err = ForgeError::input("Schema is required");
        assert_eq!(err.message(), "Schema is required");
        assert!(err.to_string().starts_with("invalid input: Schema is required (at "));
    }

    #[test]
    fn extraction_keeps_raw_output() {
        let err = ForgeError::extraction("no schema found", "I cannot help with that");
        assert_eq!(err.raw_output(), Some("I cannot help with that"));
        assert!(ForgeError::input("x").raw_output().is_none());
    }

    #[test]
    fn unsupported_dialect_names_the_token() {
        let err = ForgeError::unsupported_dialect("oracle");
        assert_eq!(err.message(), "Unsupported database type: oracle");
    }
}
