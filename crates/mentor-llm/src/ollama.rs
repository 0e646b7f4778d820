//! Ollama chat completion client.
//!
//! Talks to any server implementing the Ollama `/api/chat` endpoint.
//! Requests are non-streaming; transient failures (connect errors,
//! timeouts, 5xx, 429) are retried with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use mentor_core::config::LlmConfig;
use mentor_core::error::{MentorError, Result};
use mentor_core::types::ChatMessage;

use crate::retry::RetryPolicy;
use crate::service::CompletionService;

/// Per-attempt failure, classified for retry decisions.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}: {1}")]
    Status(reqwest::StatusCode, String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Transport(e) => e.is_timeout() || e.is_connect(),
            AttemptError::Status(status, _) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            AttemptError::Malformed(_) => false,
        }
    }
}

/// Chat completion client for Ollama-compatible servers.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    policy: RetryPolicy,
}

impl OllamaClient {
    /// Create a client from configuration.
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MentorError::Completion(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            policy: RetryPolicy::from_config(config),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> std::result::Result<String, AttemptError> {
        let response = self.http.post(url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status(status, body));
        }

        let json: serde_json::Value = response.json().await?;
        json["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                AttemptError::Malformed("no 'message.content' field in response".to_string())
            })
    }
}

#[async_trait]
impl CompletionService for OllamaClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        debug!(
            model = %self.model,
            message_count = messages.len(),
            "Completion request"
        );

        let mut retries = 0u32;
        loop {
            match self.attempt(&url, &payload).await {
                Ok(content) => return Ok(content),
                Err(err) => {
                    if !err.is_retryable() || retries >= self.policy.max_retries {
                        return Err(MentorError::Completion(err.to_string()));
                    }
                    let delay_ms = self.policy.delay_ms(retries);
                    retries += 1;
                    warn!(
                        retry = retries,
                        delay_ms = delay_ms,
                        error = %err,
                        "Completion attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}
