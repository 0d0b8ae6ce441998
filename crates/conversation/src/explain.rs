use crate::error::ConversationError;
use crate::store::{render_prompt, ConversationSnapshot, ConversationStore, Role};
use common::config::components::DEFAULT_EXPLANATION_MODEL;
use common::types::Dialect;
use serde::Serialize;
use shared_clients::{GenerationRequest, LanguageModel};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainRequest {
    pub session_id: String,
    pub query: Option<String>,
    pub database_type: Dialect,
    pub question: Option<String>,
}

/// Model parameters for explanations.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ExplainSettings {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

impl Default for ExplainSettings {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLANATION_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub conversation: ConversationSnapshot,
}

/// Explains `request.query` or answers a follow-up about the session's
/// current query.
///
/// A supplied query always starts a fresh conversation. The store lock is
/// released while the model runs.
pub async fn explain(
    store: &ConversationStore,
    model: &dyn LanguageModel,
    settings: &ExplainSettings,
    request: ExplainRequest,
) -> Result<Explanation, ConversationError> {
    let query = request.query.filter(|q| !q.is_empty());
    let question = request.question.filter(|q| !q.is_empty());
    let is_followup = query.is_none();

    if let Some(query) = &query {
        store.create_or_reset(&request.session_id, Some(query.clone()), request.database_type);
    }

    let prompt = store
        .with_session(&request.session_id, |context| {
            context.map(|context| render_prompt(context, question.as_deref()))
        })
        .ok_or_else(ConversationError::no_active_conversation)?;

    info!(
        session = %request.session_id,
        is_followup,
        "generating query explanation"
    );
    let reply = model
        .generate(GenerationRequest::new(
            prompt,
            settings.model_id.as_str(),
            settings.max_tokens,
            settings.temperature,
        ))
        .await?;

    if let Some(question) = question {
        store.add_message(&request.session_id, Role::User, question);
    }
    store.add_message(&request.session_id, Role::Assistant, reply.as_str());

    let conversation = store
        .with_session(&request.session_id, |context| {
            context.map(|context| context.snapshot(is_followup))
        })
        .ok_or_else(ConversationError::no_active_conversation)?;

    Ok(Explanation {
        explanation: reply,
        conversation,
    })
}
