use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::error::ForgeError;
use common::types::Dialect;
use serde::Deserialize;
use serde_json::json;
use translate::functions::function_catalog;

#[derive(Debug, Default, Deserialize)]
pub struct FunctionsQuery {
    #[serde(default)]
    pub database_type: Option<String>,
}

fn supported_db_types() -> Vec<&'static str> {
    Dialect::QUERY_DIALECTS.iter().map(Dialect::as_str).collect()
}

/// Configured schema and query models that the model service reports as
/// present.
async fn available_models(state: &AppState) -> Vec<String> {
    let models = &state.config.models;
    let mut candidates = vec![models.schema_model.as_str()];
    if models.query_model != models.schema_model {
        candidates.push(models.query_model.as_str());
    }

    let mut available = Vec::new();
    for model in candidates.into_iter().filter(|m| !m.is_empty()) {
        if state.model.is_available(model).await {
            available.push(model.to_string());
        }
    }
    available
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "available_models": available_models(&state).await,
        "supported_db_types": supported_db_types(),
    }))
}

pub async fn models_status(state: web::Data<AppState>) -> HttpResponse {
    let models = &state.config.models;
    HttpResponse::Ok().json(json!({
        "status": "success",
        "available_models": available_models(&state).await,
        "configured_models": {
            "schema": models.schema_model,
            "query": models.query_model,
            "explanation": models.explanation_model,
            "data": models.data_model(),
        },
        "supported_db_types": supported_db_types(),
    }))
}

pub async fn supported_functions(
    query: web::Query<FunctionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let token = query
        .into_inner()
        .database_type
        .unwrap_or_else(|| "all".to_string())
        .to_ascii_lowercase();

    if token == "all" {
        return Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "supported_functions": function_catalog(None),
        })));
    }

    let dialect = token
        .parse::<Dialect>()
        .ok()
        .filter(|d| Dialect::QUERY_DIALECTS.contains(d))
        .ok_or_else(|| {
            ForgeError::input(format!(
                "Unsupported database type: {token}. Available types are: {}",
                supported_db_types().join(", ")
            ))
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "database_type": dialect,
        "supported_functions": function_catalog(Some(dialect)),
    })))
}
