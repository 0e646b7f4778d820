//! Error types for the conversation pipeline.

/// Errors surfaced by the conversation orchestrator.
///
/// Collaborator failures never appear here: the orchestrator degrades
/// those to a canned apology instead of propagating them.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("session not found: {0}")]
    SessionNotFound(String),
}
