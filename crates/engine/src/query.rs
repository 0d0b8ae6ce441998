use crate::EngineError;
use common::config::ModelsConfig;
use common::types::Dialect;
use extract::{extract_sql_statement, validate_syntax};
use serde::Serialize;
use serde_json::Value;
use shared_clients::{GenerationRequest, LanguageModel};
use tracing::info;
use translate::functions::function_reference;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub prompt: String,
    pub dialect: Dialect,
    /// Schema handed to the model as context, if any.
    pub schema_context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedQuery {
    pub query: String,
    pub database_type: Dialect,
    pub is_valid: bool,
    pub validation_message: String,
}

pub fn query_prompt(request: &QueryRequest) -> String {
    let dialect = request.dialect.as_str().to_uppercase();
    let mut prompt = format!(
        "### Task\nGenerate a {dialect} SQL query for:\n{}\n\n### Database Type\n{dialect}\n\n",
        request.prompt
    );

    if let Some(schema) = request.schema_context.as_ref().filter(|s| !is_blank(s)) {
        let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
        prompt.push_str(&format!("### Database Schema\n{rendered}\n\n"));
    }

    prompt.push_str(&format!(
        "### Important Instructions\n\
         1. Use proper {dialect} syntax\n\
         2. Include all necessary built-in functions\n\
         3. Return only the SQL query wrapped in ```sql ```\n\n\
         ### Function Reference\n{}\n\n\
         ### SQL Query\n",
        function_reference(request.dialect)
    ));
    prompt
}

/// Outer instructions wrapped around every query prompt before it reaches
/// the query model.
fn expert_prompt(task: &str) -> String {
    format!(
        "You are a SQL expert. Generate a SQL query for the following request:\n\n\
         {task}\n\n\
         Important Instructions:\n\
         1. Use the correct SQL dialect for the specified database type\n\
         2. Include all necessary built-in functions\n\
         3. Ensure proper syntax for the database type\n\
         4. Return only the SQL query wrapped in ```sql ``` markers\n"
    )
}

/// True for null, whitespace-only strings and empty arrays or objects.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub async fn generate_query(
    model: &dyn LanguageModel,
    models: &ModelsConfig,
    request: &QueryRequest,
) -> Result<GeneratedQuery, EngineError> {
    if request.prompt.trim().is_empty() {
        return Err(EngineError::invalid_input("Input prompt is required"));
    }
    info!(dialect = %request.dialect, "generating query");

    let raw = model
        .generate(GenerationRequest::new(
            expert_prompt(&query_prompt(request)),
            models.query_model.as_str(),
            1024,
            0.1,
        ))
        .await?;
    let query = extract_sql_statement(&raw);
    let check = validate_syntax(&query, request.dialect);

    Ok(GeneratedQuery {
        query,
        database_type: request.dialect,
        validation_message: if check.valid {
            "Valid query".to_string()
        } else {
            check.reason
        },
        is_valid: check.valid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_schema_values() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!([{"name": "users"}])));
        assert!(!is_blank(&json!(0)));
    }

    fn request(schema: Option<Value>) -> QueryRequest {
        QueryRequest {
            prompt: "count users".into(),
            dialect: Dialect::Trino,
            schema_context: schema,
        }
    }

    #[test]
    fn prompt_sections_in_order() {
        let prompt = query_prompt(&request(Some(json!([{"name": "users"}]))));
        let task = prompt.find("### Task\nGenerate a TRINO SQL query for:\ncount users").unwrap();
        let schema = prompt.find("### Database Schema\n[\n  {\n    \"name\": \"users\"").unwrap();
        let reference = prompt.find("### Function Reference\n# TRINO SQL Function Reference").unwrap();
        assert!(task < schema && schema < reference);
        assert!(prompt.ends_with("### SQL Query\n"));
    }

    #[test]
    fn blank_schema_is_omitted() {
        assert!(!query_prompt(&request(Some(json!("")))).contains("### Database Schema"));
        assert!(!query_prompt(&request(Some(json!([])))).contains("### Database Schema"));
        assert!(!query_prompt(&request(None)).contains("### Database Schema"));
    }
}
