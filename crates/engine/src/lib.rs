//! Model-backed tasks: schema and query generation, free-text prompts and
//! synthetic data. Each task takes the model as a trait object so the HTTP
//! layer and tests can supply any implementation.

pub mod error;
pub mod query;
pub mod schema;
pub mod synthetic;

pub use error::EngineError;
pub use query::{generate_query, is_blank, GeneratedQuery, QueryRequest};
pub use schema::{generate_schema, GeneratedSchema};
pub use synthetic::{populate, PopulateOutcome, RecordSource, SyntheticRequest};

use common::config::ModelsConfig;
use shared_clients::{GenerationRequest, LanguageModel};
use tracing::info;

/// Free-text generation on the schema model with the configured defaults.
pub async fn generate_text(
    model: &dyn LanguageModel,
    models: &ModelsConfig,
    prompt: &str,
) -> Result<String, EngineError> {
    if prompt.trim().is_empty() {
        return Err(EngineError::invalid_input("Input prompt is required"));
    }
    let preview: String = prompt.chars().take(50).collect();
    info!(prompt = %preview, "processing NLP task request");

    Ok(model
        .generate(GenerationRequest::new(
            prompt,
            models.schema_model.as_str(),
            models.max_tokens,
            models.temperature,
        ))
        .await?)
}
