//! Mentor API crate - HTTP surface for the mentoring backend.
//!
//! Thin axum handlers over the conversation orchestrator, the audio job
//! coordinator, and the transcription collaborator, plus session
//! management, default suggestions, and static serving of synthesized
//! audio artifacts.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, AuditLog};
