use super::elapsed_secs;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::error::ForgeError;
use common::types::Dialect;
use conversation::{explain, ExplainRequest, ExplainSettings};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_MAX_AGE_MINUTES: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct ExplainBody {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub database_type: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupBody {
    #[serde(default)]
    pub max_age_minutes: Option<u64>,
}

/// Unknown or non-query dialects fall back to postgres.
fn explain_dialect(token: Option<&str>) -> Dialect {
    let token = token.unwrap_or("postgres");
    match token.parse::<Dialect>() {
        Ok(dialect) if Dialect::QUERY_DIALECTS.contains(&dialect) => dialect,
        _ => {
            warn!(database_type = %token, "unsupported database type, defaulting to postgres");
            Dialect::Postgres
        }
    }
}

pub async fn explain_query(
    state: web::Data<AppState>,
    body: web::Json<ExplainBody>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let body = body.into_inner();

    let session_id = body
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ForgeError::input("session_id is required"))?;
    let query = body.query.filter(|q| !q.is_empty());
    let question = body.question.filter(|q| !q.is_empty());
    if query.is_none() && question.is_none() {
        return Err(ForgeError::input("Either query or question is required").into());
    }
    let database_type = explain_dialect(body.database_type.as_deref());

    let settings = ExplainSettings::new(state.config.models.explanation_model.as_str());
    let explanation = explain(
        &state.conversations,
        state.model.as_ref(),
        &settings,
        ExplainRequest {
            session_id: session_id.clone(),
            query,
            database_type,
            question,
        },
    )
    .await?;
    info!(
        session = %session_id,
        elapsed = elapsed_secs(started),
        "query explanation completed"
    );

    let conversation = explanation.conversation;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "response": explanation.explanation,
        "session_id": session_id,
        "database_type": conversation.database_type,
        "query": conversation.query,
        "history_length": conversation.history_length,
        "is_followup": conversation.is_followup,
        "execution_time_seconds": elapsed_secs(started),
    })))
}

pub async fn cleanup_conversations(
    state: web::Data<AppState>,
    body: Option<web::Json<CleanupBody>>,
) -> Result<HttpResponse, ApiError> {
    let minutes = body
        .and_then(|b| b.into_inner().max_age_minutes)
        .unwrap_or(DEFAULT_MAX_AGE_MINUTES);

    let removed = state
        .conversations
        .cleanup(Duration::from_secs(minutes.saturating_mul(60)));
    info!(removed, "cleaned up conversations");

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Removed {removed} old conversations"),
        "active_conversations": state.conversations.len(),
    })))
}
