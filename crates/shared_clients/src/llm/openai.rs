use super::{http_client, GenerationRequest, LanguageModel, ModelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    api_base: String,
    api_key: String,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(api_base: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        let body = ChatBody {
            model: &request.model_id,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        debug!(model = %request.model_id, "sending chat completion request");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), model = %request.model_id, "chat completion API error");
            return Err(ModelError::status(
                status,
                format!("chat completion API error: {detail}"),
            ));
        }

        let reply: ChatReply = resp.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::invalid_response("response carried no choices"))
    }

    /// Hosted models are assumed to be present once a key is configured.
    async fn is_available(&self, _model_id: &str) -> bool {
        true
    }
}
