use crate::EngineError;
use common::config::ModelsConfig;
use common::types::CanonicalSchema;
use extract::{extract_schema, ModelOutput};
use serde::Serialize;
use shared_clients::{GenerationRequest, LanguageModel};
use tracing::{debug, error, info};
use translate::format_schema_markdown;

pub const SCHEMA_PARSE_FAILURE: &str = "Failed to parse schema response. The schema must include \
'tables' array with each table having 'name' and 'columns', and each column must have at least \
'name' and 'data_type'.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSchema {
    pub schema: CanonicalSchema,
    pub formatted_output: String,
}

pub fn schema_prompt(description: &str) -> String {
    format!(
        "Generate a database schema based on: {description}\n\
         Return in PROPER JSON format (with double quotes) with tables, columns, \
         data types, primary keys, foreign keys, and constraints.\n\
         Format must be:\n```json\n{{\"tables\": [{{\"name\": \"table_name\", \"columns\": \
         [{{\"name\": \"column_name\", \"data_type\": \"type\", \"primary_key\": boolean, \
         \"foreign_key\": {{\"table\": \"ref_table\", \"column\": \"ref_column\"}}, \
         \"unique\": boolean, \"default\": value}}]}}]}}\n```"
    )
}

/// Asks the schema model for a schema and extracts it from the reply.
///
/// An unusable reply is an extraction error carrying the raw model text.
pub async fn generate_schema(
    model: &dyn LanguageModel,
    models: &ModelsConfig,
    description: &str,
) -> Result<GeneratedSchema, EngineError> {
    if description.trim().is_empty() {
        return Err(EngineError::invalid_input("Input prompt is required"));
    }
    let preview: String = description.chars().take(50).collect();
    info!(prompt = %preview, "processing schema generation");

    let raw = model
        .generate(GenerationRequest::new(
            schema_prompt(description),
            models.schema_model.as_str(),
            2048,
            0.3,
        ))
        .await?;
    debug!(raw = %raw, "raw schema response");

    match extract_schema(&ModelOutput::from(raw.as_str())) {
        Some(schema) => Ok(GeneratedSchema {
            formatted_output: format_schema_markdown(&schema),
            schema,
        }),
        None => {
            error!("failed to parse schema from model response");
            Err(EngineError::extraction(SCHEMA_PARSE_FAILURE, raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_description_and_format() {
        let prompt = schema_prompt("a blog");
        assert!(prompt.starts_with("Generate a database schema based on: a blog\n"));
        assert!(prompt.contains("```json\n{\"tables\": [{\"name\": \"table_name\""));
        assert!(prompt.ends_with("\"default\": value}]}]}\n```"));
    }
}
