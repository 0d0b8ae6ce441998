pub mod database;
pub mod explain;
pub mod generate;
pub mod status;

use crate::error::ApiError;
use actix_web::web;
use common::error::ForgeError;
use common::types::CanonicalSchema;
use serde_json::Value;
use std::time::Instant;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(status::health))
        .route("/models/status", web::get().to(status::models_status))
        .route("/supported-functions", web::get().to(status::supported_functions))
        .route("/generate-schema", web::post().to(generate::generate_schema))
        .route("/generate-query", web::post().to(generate::generate_query))
        .route("/generate-schema-sql", web::post().to(generate::generate_schema_sql))
        .route("/generate-schema-json", web::post().to(generate::generate_schema_json))
        .route("/nlp-task", web::post().to(generate::nlp_task))
        .route("/explain-query", web::post().to(explain::explain_query))
        .route("/cleanup-conversations", web::post().to(explain::cleanup_conversations))
        .route("/connect-db", web::post().to(database::connect_db))
        .route("/connection-status", web::get().to(database::connection_status))
        .route("/get-tables", web::get().to(database::get_tables))
        .route("/get-full-schema", web::get().to(database::get_full_schema))
        .route("/execute-sql", web::post().to(database::execute_sql))
        .route("/generate-data", web::post().to(database::generate_data));
}

/// Seconds since `started`, rounded to two decimals.
pub(crate) fn elapsed_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}

/// Reads a canonical schema out of a request body field.
pub(crate) fn canonical_schema(value: Option<Value>) -> Result<CanonicalSchema, ApiError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| ForgeError::input("Schema data is required"))?;

    let has_tables = value
        .get("tables")
        .and_then(Value::as_array)
        .is_some_and(|tables| !tables.is_empty());
    if !has_tables {
        return Err(ForgeError::input("Invalid schema format or empty schema").into());
    }

    let schema: CanonicalSchema = serde_json::from_value(value)
        .map_err(|err| ForgeError::input(format!("Invalid schema format: {err}")))?;
    schema.validate()?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_field_must_hold_tables() {
        let missing = canonical_schema(None).unwrap_err();
        assert_eq!(missing.inner().message(), "Schema data is required");

        let empty = canonical_schema(Some(json!({"tables": []}))).unwrap_err();
        assert_eq!(empty.inner().message(), "Invalid schema format or empty schema");

        let schema = canonical_schema(Some(json!({"tables": [
            {"name": "t", "columns": [{"name": "id", "data_type": "INT"}]}
        ]})))
        .unwrap();
        assert_eq!(schema.tables[0].name, "t");
    }
}
