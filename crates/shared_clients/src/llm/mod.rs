mod ollama;
mod openai;
mod router;

pub use ollama::OllamaClient;
pub use openai::OpenAiCompatClient;
pub use router::ModelRouter;

use async_trait::async_trait;
use common::error::{DiagnosticMessage, ForgeError};
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// One completion request. Token budget and temperature are per call
/// because each task (schema, query, explanation) uses its own.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        model_id: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model_id: model_id.into(),
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out: {context}")]
    Timeout { context: DiagnosticMessage },
    #[error("model request failed: {context}")]
    Request {
        context: DiagnosticMessage,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("model API returned {status}: {context}")]
    Status {
        status: u16,
        context: DiagnosticMessage,
    },
    #[error("unexpected model response: {context}")]
    InvalidResponse { context: DiagnosticMessage },
    #[error("model client not configured: {context}")]
    NotConfigured { context: DiagnosticMessage },
}

impl ModelError {
    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status: status.as_u16(),
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Timeout { context }
            | Self::Request { context, .. }
            | Self::Status { context, .. }
            | Self::InvalidResponse { context }
            | Self::NotConfigured { context } => context.message(),
        }
    }
}

impl From<reqwest::Error> for ModelError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::timeout(err.to_string())
        } else if err.is_decode() {
            ModelError::invalid_response(err.to_string())
        } else {
            ModelError::Request {
                context: DiagnosticMessage::new(err.to_string()),
                source: Some(err),
            }
        }
    }
}

impl From<ModelError> for ForgeError {
    #[track_caller]
    fn from(err: ModelError) -> Self {
        ForgeError::model_with(err.message().to_string(), err)
    }
}

/// The text-generation collaborator. Implementations never panic; every
/// failure surfaces as a [`ModelError`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError>;

    async fn is_available(&self, model_id: &str) -> bool;
}

pub type SharedModel = Arc<dyn LanguageModel>;

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        (**self).generate(request).await
    }

    async fn is_available(&self, model_id: &str) -> bool {
        (**self).is_available(model_id).await
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ModelError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(ModelError::from)
}
