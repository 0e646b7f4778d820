//! Completion service trait and test doubles.
//!
//! The orchestrator talks to the model server only through this trait,
//! so tests can swap in scripted or failing implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mentor_core::error::{MentorError, Result};
use mentor_core::types::ChatMessage;

// =============================================================================
// Trait
// =============================================================================

/// Service for turning a chat transcript into a single assistant message.
///
/// Implementations receive the full message list (system prompt, replayed
/// history, and the latest user message) and return the raw completion text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate a completion for the given messages.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

// =============================================================================
// Test doubles
// =============================================================================

/// Completion double that replays a fixed queue of responses.
///
/// Each call pops the next response and records the messages it was
/// given, so tests can assert on prompt construction. Calling with an
/// empty queue returns an error.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Message batches received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of completions performed so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        let next = match self.responses.lock() {
            Ok(mut responses) => responses.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.ok_or_else(|| {
            MentorError::Completion("No scripted response available".to_string())
        })
    }
}

/// Completion double that always fails with the given message.
pub struct FailingCompletion {
    message: String,
}

impl FailingCompletion {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(MentorError::Completion(self.message.clone()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_completion_replays_in_order() {
        let service = ScriptedCompletion::new(vec!["first", "second"]);
        let messages = vec![ChatMessage::user("hello")];

        let a = service.complete(&messages).await.unwrap();
        let b = service.complete(&messages).await.unwrap();
        assert_eq!(a, "first");
        assert_eq!(b, "second");
    }

    #[tokio::test]
    async fn test_scripted_completion_exhausted() {
        let service = ScriptedCompletion::new(vec!["only"]);
        let messages = vec![ChatMessage::user("hello")];

        service.complete(&messages).await.unwrap();
        let err = service.complete(&messages).await.unwrap_err();
        assert!(matches!(err, MentorError::Completion(_)));
    }

    #[tokio::test]
    async fn test_scripted_completion_records_calls() {
        let service = ScriptedCompletion::new(vec!["a", "b"]);

        service
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("one")])
            .await
            .unwrap();
        service
            .complete(&[ChatMessage::user("two")])
            .await
            .unwrap();

        let calls = service.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][1].content, "one");
        assert_eq!(calls[1][0].content, "two");
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_completion() {
        let service = FailingCompletion::new("connection refused");
        let err = service
            .complete(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_doubles_are_object_safe() {
        let services: Vec<Box<dyn CompletionService>> = vec![
            Box::new(ScriptedCompletion::new(vec!["ok"])),
            Box::new(FailingCompletion::new("down")),
        ];
        let messages = vec![ChatMessage::user("hi")];

        assert!(services[0].complete(&messages).await.is_ok());
        assert!(services[1].complete(&messages).await.is_err());
    }
}
