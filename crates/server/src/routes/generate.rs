use super::{canonical_schema, elapsed_secs};
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::error::ForgeError;
use common::types::Dialect;
use engine::{is_blank, QueryRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};
use translate::{select_table, synthesize, to_simplified};

#[derive(Debug, Default, Deserialize)]
pub struct PromptBody {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub schema: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaSqlBody {
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub dialect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaJsonBody {
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default, rename = "tableName")]
    pub table_name: Option<String>,
}

fn required_prompt(prompt: Option<String>) -> Result<String, ApiError> {
    match prompt {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
        _ => Err(ForgeError::input("Input prompt is required").into()),
    }
}

pub async fn generate_schema(
    state: web::Data<AppState>,
    body: web::Json<PromptBody>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let prompt = required_prompt(body.into_inner().prompt)?;

    let generated =
        engine::generate_schema(state.model.as_ref(), &state.config.models, &prompt).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "schema": generated.schema,
        "formatted_output": generated.formatted_output,
        "execution_time_seconds": elapsed_secs(started),
    })))
}

/// Generates a query. Without a schema in the request the live schema of
/// the active connection is used, and its dialect wins.
pub async fn generate_query(
    state: web::Data<AppState>,
    body: web::Json<QueryBody>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let body = body.into_inner();
    let prompt = required_prompt(body.prompt)?;
    let mut dialect: Dialect = body
        .database_type
        .as_deref()
        .unwrap_or("postgres")
        .parse()?;

    let mut schema_context = body.schema.filter(|s| !is_blank(s));
    let mut auto_schema_used = false;
    if schema_context.is_none() {
        if let Some(connection) = state.connection() {
            let backend = database_adapters::create_backend(&connection);
            match backend.introspect_schema().await {
                Ok(schema) => {
                    info!(tables = schema.tables.len(), "auto-fetched live schema");
                    schema_context = Some(json!(schema.tables));
                    if let Some(live) = connection.kind.sql_dialect() {
                        dialect = live;
                    }
                    auto_schema_used = true;
                }
                Err(err) => warn!(error = %err, "schema auto-fetch failed"),
            }
        }
    }

    let generated = engine::generate_query(
        state.model.as_ref(),
        &state.config.models,
        &QueryRequest {
            prompt,
            dialect,
            schema_context,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "query": generated.query,
        "database_type": generated.database_type,
        "is_valid": generated.is_valid,
        "validation_message": generated.validation_message,
        "auto_schema_used": auto_schema_used,
        "execution_time_seconds": elapsed_secs(started),
    })))
}

pub async fn generate_schema_sql(
    body: web::Json<SchemaSqlBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let schema = canonical_schema(body.schema)?;
    let dialect: Dialect = body.dialect.as_deref().unwrap_or("mysql").parse()?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "dialect": dialect,
        "sql": synthesize(&schema, dialect),
    })))
}

pub async fn generate_schema_json(
    body: web::Json<SchemaJsonBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let schema = canonical_schema(body.schema)?;
    let table = select_table(&schema, body.table_name.as_deref())?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "json": to_simplified(table),
    })))
}

pub async fn nlp_task(
    state: web::Data<AppState>,
    body: web::Json<PromptBody>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let prompt = required_prompt(body.into_inner().prompt)?;

    let response =
        engine::generate_text(state.model.as_ref(), &state.config.models, &prompt).await?;
    info!(elapsed = elapsed_secs(started), "NLP task completed");

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "response": response,
        "execution_time_seconds": elapsed_secs(started),
    })))
}
