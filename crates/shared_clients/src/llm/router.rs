use super::{GenerationRequest, LanguageModel, ModelError, OllamaClient, OpenAiCompatClient};
use async_trait::async_trait;
use common::config::ModelsConfig;
use tracing::debug;

/// Sends the schema model to the hosted endpoint when a key is configured
/// and every other model to Ollama.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    schema_model: String,
    hosted: Option<OpenAiCompatClient>,
    ollama: OllamaClient,
}

impl ModelRouter {
    pub fn new(hosted: Option<OpenAiCompatClient>, ollama: OllamaClient, schema_model: &str) -> Self {
        Self {
            schema_model: schema_model.to_string(),
            hosted,
            ollama,
        }
    }

    pub fn from_config(config: &ModelsConfig) -> Result<Self, ModelError> {
        let hosted = match config.openai_api_key.as_deref() {
            Some(key) if !key.is_empty() => Some(OpenAiCompatClient::new(
                &config.openai_api_base,
                key,
                config.request_timeout_secs,
            )?),
            _ => None,
        };
        let ollama = OllamaClient::new(&config.ollama_api_base, config.request_timeout_secs)?;
        Ok(Self::new(hosted, ollama, &config.schema_model))
    }

    fn route(&self, model_id: &str) -> &dyn LanguageModel {
        match &self.hosted {
            Some(hosted) if !self.schema_model.is_empty() && model_id == self.schema_model => {
                hosted
            }
            _ => &self.ollama,
        }
    }
}

#[async_trait]
impl LanguageModel for ModelRouter {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        if request.model_id.is_empty() {
            return Err(ModelError::not_configured(
                "no model name configured for this task",
            ));
        }
        debug!(model = %request.model_id, "routing generation request");
        self.route(&request.model_id).generate(request).await
    }

    async fn is_available(&self, model_id: &str) -> bool {
        self.route(model_id).is_available(model_id).await
    }
}
