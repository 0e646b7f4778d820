//! Mentor chat crate - the conversation pipeline around the language model.
//!
//! Parses free-form completions into an answer plus follow-up suggestions,
//! keeps per-session conversation history, and orchestrates one turn end to
//! end across the retrieval, completion, and speech collaborators.

pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod suggest;

pub use error::ChatError;
pub use orchestrator::{MentorOrchestrator, TurnOutcome, APOLOGY_REPLY};
pub use parser::{parse, ParsedAnswer};
pub use session::{Session, SessionStore, SessionSummary};
pub use suggest::default_suggestions;
