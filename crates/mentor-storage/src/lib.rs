//! Mentor storage crate - SQLite audit log for completed turns.
//!
//! Persists users and their conversations append-only. Audit rows are
//! never replayed into the completion collaborator; in-memory session
//! history serves that purpose.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ConversationRepository, UserRepository};
