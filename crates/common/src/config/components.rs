use serde::Deserialize;

pub const DEFAULT_EXPLANATION_MODEL: &str = "codellama:7b-instruct-q4_0";

// ---------------- global config ----------------
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForgeConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Model endpoints and generation defaults.
///
/// `openai_api_key` switches schema generation to the OpenAI-compatible
/// endpoint; everything else goes to Ollama.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    pub ollama_api_base: String,
    pub openai_api_base: String,
    pub openai_api_key: Option<String>,
    pub schema_model: String,
    pub query_model: String,
    pub explanation_model: String,
    pub data_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            ollama_api_base: "http://localhost:11434/api".to_string(),
            openai_api_base: "https://chatapi.akash.network/api/v1".to_string(),
            openai_api_key: None,
            schema_model: String::new(),
            query_model: String::new(),
            explanation_model: DEFAULT_EXPLANATION_MODEL.to_string(),
            data_model: String::new(),
            max_tokens: 2048,
            temperature: 0.7,
            request_timeout_secs: 120,
        }
    }
}

impl ModelsConfig {
    /// Model used for synthetic records; falls back to the schema model.
    pub fn data_model(&self) -> &str {
        if self.data_model.is_empty() {
            &self.schema_model
        } else {
            &self.data_model
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationConfig {
    pub max_history: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { max_history: 5 }
    }
}
