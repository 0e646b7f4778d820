//! Conversation orchestrator: one mentoring turn end to end.
//!
//! Holds the per-session lock across the whole turn (snapshot history,
//! reformulate, retrieve, generate, parse, append), so turns within one
//! session never interleave. Collaborator failures and timeouts degrade
//! the turn to a fixed apology instead of surfacing an error; the turn
//! is still recorded with the apology as the assistant reply.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use mentor_core::error::{MentorError, Result};
use mentor_core::types::ChatMessage;
use mentor_llm::CompletionService;
use mentor_retrieval::Retriever;

use crate::error::ChatError;
use crate::parser::{self, ParsedAnswer};
use crate::prompt;
use crate::session::SessionStore;

/// Reply used when the retrieval or completion collaborator fails.
pub const APOLOGY_REPLY: &str =
    "I'm having trouble connecting to my knowledge base. Please try again later.";

/// The result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The parsed answer recorded in the session.
    pub answer: ParsedAnswer,
    /// Whether the turn fell back to the apology reply.
    pub degraded: bool,
}

/// Coordinates the retrieval and completion collaborators for each turn
/// and owns the session history they read and write.
pub struct MentorOrchestrator {
    completion: Arc<dyn CompletionService>,
    retriever: Arc<dyn Retriever>,
    sessions: Arc<SessionStore>,
    collaborator_timeout: Duration,
}

impl MentorOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        retriever: Arc<dyn Retriever>,
        sessions: Arc<SessionStore>,
        collaborator_timeout: Duration,
    ) -> Self {
        Self {
            completion,
            retriever,
            sessions,
            collaborator_timeout,
        }
    }

    /// The session store backing this orchestrator, for the session
    /// management endpoints.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one turn for `session_id`.
    ///
    /// The query must be non-empty after trimming; nothing is recorded
    /// for an empty query. Everything past that point succeeds: a
    /// collaborator failure produces a degraded outcome, not an error.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        query: &str,
    ) -> std::result::Result<TurnOutcome, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let session = self.sessions.get_or_create(session_id);
        // Held across the whole turn: history snapshot through append.
        let mut history = session.lock_history().await;

        let outcome = match self.generate_reply(&history, query).await {
            Ok(answer) => {
                debug!(
                    session = %session_id,
                    suggestions = answer.suggestions.len(),
                    "Turn completed"
                );
                TurnOutcome {
                    answer,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "Turn degraded to apology");
                TurnOutcome {
                    answer: ParsedAnswer {
                        main_text: APOLOGY_REPLY.to_string(),
                        suggestions: Vec::new(),
                    },
                    degraded: true,
                }
            }
        };

        session.record_turn(
            &mut history,
            query,
            &outcome.answer.main_text,
            self.sessions.max_history_messages(),
        );

        Ok(outcome)
    }

    // -- Private helpers --

    /// Reformulate, retrieve, generate, and parse one reply.
    async fn generate_reply(&self, history: &[ChatMessage], query: &str) -> Result<ParsedAnswer> {
        let standalone = if history.is_empty() {
            query.to_string()
        } else {
            self.reformulate(history, query).await
        };

        let chunks = self
            .bounded("retrieval", self.retriever.retrieve(&standalone))
            .await?;
        let context = prompt::format_context(&chunks);
        debug!(chunks = chunks.len(), "Context retrieved");

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt::mentor_system_prompt(&context)));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(query));

        let raw = self
            .bounded("completion", self.completion.complete(&messages))
            .await?;

        Ok(parser::parse(&raw))
    }

    /// Rewrite a follow-up question into a standalone one using the
    /// history. Falls back to the raw query on failure or empty output;
    /// retrieval quality degrades but the turn proceeds.
    async fn reformulate(&self, history: &[ChatMessage], query: &str) -> String {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt::CONTEXTUALIZE_SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(query));

        match self
            .bounded("reformulation", self.completion.complete(&messages))
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                let standalone = text.trim().to_string();
                debug!(standalone = %standalone, "Query reformulated");
                standalone
            }
            Ok(_) => query.to_string(),
            Err(e) => {
                warn!(error = %e, "Reformulation failed, using raw query");
                query.to_string()
            }
        }
    }

    /// Run a collaborator call under the configured timeout.
    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.collaborator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(MentorError::Timeout(what.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
