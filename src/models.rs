use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange attributed to a user. Immutable once written:
/// a turn only exists after an answer was successfully generated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationTurn {
    pub user_id: String,
    pub pregunta: String,
    pub respuesta: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub pregunta: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub respuesta: String,
}

/// Passage returned by the vector index for one query. Transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    pub text: String,
    pub source_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugQuery {
    pub token: String,
    #[serde(default = "default_limite")]
    pub limite: i64,
}

fn default_limite() -> i64 {
    50
}

impl DebugQuery {
    /// Row window for the debug view. Negative values from the query string
    /// clamp to zero so every store backend sees a sane LIMIT.
    pub fn limite(&self) -> i64 {
        self.limite.max(0)
    }
}

// OpenAI-compatible chat completion wire types.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: Option<String>,
}
