pub mod llm;

pub use llm::{
    GenerationRequest, LanguageModel, ModelError, ModelRouter, OllamaClient, OpenAiCompatClient,
    SharedModel,
};
