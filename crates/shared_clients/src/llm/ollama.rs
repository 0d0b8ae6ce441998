use super::{http_client, GenerationRequest, LanguageModel, ModelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// API base, e.g. `http://localhost:11434/api`.
    api_base: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(api_base: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client: http_client(timeout_secs)?,
        })
    }

    /// Server root without the `/api` suffix.
    fn root(&self) -> &str {
        self.api_base
            .strip_suffix("/api")
            .unwrap_or(&self.api_base)
    }

    async fn installed_models(&self) -> Result<Vec<String>, ModelError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.root()))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ModelError::status(resp.status(), "failed to list models"));
        }
        let tags: TagsReply = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        let body = GenerateBody {
            model: &request.model_id,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };
        debug!(model = %request.model_id, "sending ollama generate request");

        let resp = self
            .client
            .post(format!("{}/generate", self.api_base))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            error!(status = status.as_u16(), model = %request.model_id, "ollama API error");
            return Err(ModelError::status(
                status,
                format!("Ollama API error: {}", status.as_u16()),
            ));
        }
        let reply: GenerateReply = resp.json().await?;
        Ok(reply.response)
    }

    async fn is_available(&self, model_id: &str) -> bool {
        match self.installed_models().await {
            Ok(models) => models.iter().any(|name| name.starts_with(model_id)),
            Err(err) => {
                error!(error = %err, "error checking model availability");
                false
            }
        }
    }
}
