use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::error::{DiagnosticMessage, ForgeError};
use conversation::ConversationError;
use database_adapters::AdapterError;
use engine::EngineError;
use serde_json::json;
use shared_clients::ModelError;
use std::fmt;
use thiserror::Error;

/// A request failure rendered as `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub struct ApiError(ForgeError);

impl ApiError {
    pub fn inner(&self) -> &ForgeError {
        &self.0
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_of(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "status": "error",
            "message": self.0.message(),
        });
        if let Some(raw) = self.0.raw_output() {
            body["raw_response"] = json!(raw);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<ForgeError> for ApiError {
    fn from(err: ForgeError) -> Self {
        if status_of(&err).is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self(err)
    }
}

impl From<EngineError> for ApiError {
    #[track_caller]
    fn from(err: EngineError) -> Self {
        ForgeError::from(err).into()
    }
}

impl From<AdapterError> for ApiError {
    #[track_caller]
    fn from(err: AdapterError) -> Self {
        ForgeError::from(err).into()
    }
}

impl From<ConversationError> for ApiError {
    #[track_caller]
    fn from(err: ConversationError) -> Self {
        ForgeError::from(err).into()
    }
}

impl From<ModelError> for ApiError {
    #[track_caller]
    fn from(err: ModelError) -> Self {
        ForgeError::from(err).into()
    }
}

fn status_of(err: &ForgeError) -> StatusCode {
    match err {
        ForgeError::InputValidation { .. }
        | ForgeError::UnsupportedDialect { .. }
        | ForgeError::Extraction { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failures while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("model client setup failed: {context}")]
    Model {
        context: DiagnosticMessage,
        #[source]
        source: ModelError,
    },
    #[error("server i/o error: {context}")]
    Io {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
}

impl From<ModelError> for ServerError {
    #[track_caller]
    fn from(err: ModelError) -> Self {
        Self::Model {
            context: DiagnosticMessage::new(err.message().to_string()),
            source: err,
        }
    }
}

impl From<std::io::Error> for ServerError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            context: DiagnosticMessage::new(err.to_string()),
            source: err,
        }
    }
}
