use common::types::Dialect;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_MAX_HISTORY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// State of one explanation session.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub query: Option<String>,
    pub database_type: Dialect,
    pub history: Vec<Message>,
    pub last_updated: Instant,
}

impl ConversationContext {
    fn new(query: Option<String>, database_type: Dialect) -> Self {
        Self {
            query,
            database_type,
            history: Vec::new(),
            last_updated: Instant::now(),
        }
    }

    pub fn snapshot(&self, is_followup: bool) -> ConversationSnapshot {
        ConversationSnapshot {
            database_type: self.database_type,
            query: self.query.clone(),
            history_length: self.history.len(),
            is_followup,
        }
    }
}

/// Serializable view of a session returned alongside an explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSnapshot {
    pub database_type: Dialect,
    pub query: Option<String>,
    pub history_length: usize,
    pub is_followup: bool,
}

/// Per-session explanation state shared by all request handlers.
#[derive(Debug)]
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, ConversationContext>>,
    max_history: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationStore {
    /// History is capped at `2 * max_history` messages.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    fn history_cap(&self) -> usize {
        self.max_history * 2
    }

    pub fn create_or_reset(&self, session_id: &str, query: Option<String>, database_type: Dialect) {
        self.sessions.lock().insert(
            session_id.to_string(),
            ConversationContext::new(query, database_type),
        );
    }

    /// Appends to the session's history, creating an empty session first if
    /// needed. The oldest messages fall off once the cap is exceeded.
    pub fn add_message(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let cap = self.history_cap();
        let mut sessions = self.sessions.lock();
        let context = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationContext::new(None, Dialect::Postgres));
        context.history.push(Message {
            role,
            content: content.into(),
        });
        if context.history.len() > cap {
            let excess = context.history.len() - cap;
            context.history.drain(..excess);
        }
        context.last_updated = Instant::now();
    }

    pub fn update_query(&self, session_id: &str, query: &str, database_type: Option<Dialect>) {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(session_id) {
            Some(context) => {
                context.query = Some(query.to_string());
                if let Some(database_type) = database_type {
                    context.database_type = database_type;
                }
                context.last_updated = Instant::now();
            }
            None => {
                sessions.insert(
                    session_id.to_string(),
                    ConversationContext::new(
                        Some(query.to_string()),
                        database_type.unwrap_or(Dialect::Postgres),
                    ),
                );
            }
        }
    }

    pub fn context(&self, session_id: &str) -> Option<ConversationContext> {
        self.sessions.lock().get(session_id).cloned()
    }

    pub fn prompt_with_history(&self, session_id: &str, question: Option<&str>) -> String {
        let sessions = self.sessions.lock();
        match sessions.get(session_id) {
            Some(context) => render_prompt(context, question),
            None => question.unwrap_or_default().to_string(),
        }
    }

    /// Drops sessions idle for at least `max_age` and returns how many went.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, context| now.duration_since(context.last_updated) < max_age);
        let removed = before - sessions.len();
        debug!(removed, remaining = sessions.len(), "expired conversations");
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Runs `f` against the session under the store lock.
    pub(crate) fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(Option<&mut ConversationContext>) -> T,
    ) -> T {
        let mut sessions = self.sessions.lock();
        f(sessions.get_mut(session_id))
    }
}

pub(crate) fn render_prompt(context: &ConversationContext, question: Option<&str>) -> String {
    let mut prompt = String::from("### SQL Query Context\n");
    prompt.push_str(&format!(
        "Database Type: {}\n\n",
        context.database_type.as_str().to_uppercase()
    ));
    prompt.push_str(&format!(
        "```sql\n{}\n```\n\n",
        context.query.as_deref().unwrap_or("None")
    ));

    if !context.history.is_empty() {
        prompt.push_str("### Conversation History\n");
        for message in &context.history {
            prompt.push_str(&format!("{}: {}\n\n", message.role.label(), message.content));
        }
    }

    if let Some(question) = question.filter(|q| !q.is_empty()) {
        prompt.push_str(&format!("### New Question\n{question}\n\n"));
    }

    prompt.push_str("### Response\n");
    prompt.push_str(
        "Provide a detailed and accurate explanation of the SQL query or answer the follow-up question.",
    );
    prompt
}
