//! Application state shared across all route handlers.
//!
//! AppState holds references to the orchestrator, the audio coordinator,
//! the transcription collaborator, and the optional audit log. It is
//! passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use mentor_chat::MentorOrchestrator;
use mentor_core::config::MentorConfig;
use mentor_core::error::MentorError;
use mentor_core::types::ConversationRecord;
use mentor_speech::{AudioJobCoordinator, Transcriber};
use mentor_storage::{ConversationRepository, Database, UserRepository};

/// Append-only persistence of completed turns.
///
/// Rows attach to one configured default user; session identifiers stay
/// in memory only.
pub struct AuditLog {
    users: UserRepository,
    conversations: ConversationRepository,
    default_username: String,
}

impl AuditLog {
    pub fn new(db: Arc<Database>, default_username: &str) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&db)),
            conversations: ConversationRepository::new(db),
            default_username: default_username.to_string(),
        }
    }

    /// Persist one completed turn.
    pub fn record_turn(
        &self,
        question: &str,
        answer: &str,
        suggestions: &[String],
    ) -> Result<(), MentorError> {
        let user = self.users.get_or_create(&self.default_username)?;
        self.conversations.append(&ConversationRecord {
            id: uuid::Uuid::new_v4(),
            user_id: user.id,
            timestamp: chrono::Utc::now(),
            user_message: question.to_string(),
            bot_response: answer.to_string(),
            suggestions: suggestions.to_vec(),
        })
    }

    /// Number of persisted turns.
    pub fn turn_count(&self) -> Result<u64, MentorError> {
        self.conversations.count()
    }
}

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<MentorConfig>,
    /// Conversation pipeline for text questions.
    pub orchestrator: Arc<MentorOrchestrator>,
    /// Synthesis scheduling for spoken replies.
    pub coordinator: Arc<AudioJobCoordinator>,
    /// Speech-to-text collaborator for audio uploads.
    pub transcriber: Arc<dyn Transcriber>,
    /// Audit persistence, absent when storage is disabled.
    pub audit: Option<Arc<AuditLog>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: MentorConfig,
        orchestrator: Arc<MentorOrchestrator>,
        coordinator: Arc<AudioJobCoordinator>,
        transcriber: Arc<dyn Transcriber>,
        audit: Option<AuditLog>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            coordinator,
            transcriber,
            audit: audit.map(Arc::new),
            start_time: Instant::now(),
        }
    }

    /// Persist a completed turn when auditing is enabled.
    ///
    /// Audit failures are logged, never surfaced to the caller.
    pub fn audit_turn(&self, question: &str, answer: &str, suggestions: &[String]) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record_turn(question, answer, suggestions) {
                warn!(error = %e, "Failed to persist turn to audit log");
            }
        }
    }
}
