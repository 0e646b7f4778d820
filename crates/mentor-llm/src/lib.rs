//! Mentor LLM crate - completion service trait and Ollama-backed client.
//!
//! Provides a trait-based abstraction for chat completion, a retrying
//! HTTP client for Ollama-compatible servers, and deterministic doubles
//! for testing without a live model server.

pub mod ollama;
pub mod retry;
pub mod service;

pub use ollama::OllamaClient;
pub use retry::RetryPolicy;
pub use service::{CompletionService, FailingCompletion, ScriptedCompletion};
