use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Chat messages
// =============================================================================

/// The author of a chat message, in the wire format the completion
/// collaborator expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instruction / persona message.
    System,
    /// End-user message.
    User,
    /// Model answer.
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in a chat exchange.
///
/// This is both the session-history element and the request shape sent to
/// the completion collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Retrieval
// =============================================================================

/// One retrieved document fragment, ranked by similarity to the query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Fragment text as stored in the index.
    pub text: String,
    /// Originating document (file name or logical source id).
    pub source: String,
    /// Cosine similarity score against the query (higher is closer).
    pub score: f32,
}

// =============================================================================
// Audit records
// =============================================================================

/// A registered user in the audit store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// One completed exchange, persisted append-only.
///
/// Audit rows are never replayed into the completion collaborator; session
/// history lives in memory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub bot_response: String,
    pub suggestions: Vec<String>,
}
