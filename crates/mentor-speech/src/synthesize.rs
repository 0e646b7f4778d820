//! Text-to-speech service trait and implementations.
//!
//! `HttpSynthesizer` posts reply text to an OpenAI-compatible
//! `/v1/audio/speech` endpoint and returns the raw audio bytes.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mentor_core::config::SpeechConfig;
use mentor_core::error::{MentorError, Result};

// =============================================================================
// Trait
// =============================================================================

/// Service for synthesizing reply text into audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

// =============================================================================
// HTTP client
// =============================================================================

/// Synthesis client for OpenAI-compatible text-to-speech servers.
pub struct HttpSynthesizer {
    http: reqwest::Client,
    base_url: String,
    model: String,
    voice: String,
    format: String,
}

impl HttpSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MentorError::Synthesis(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.tts_base_url.trim_end_matches('/').to_string(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            format: config.audio_format.clone(),
        })
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(MentorError::Synthesis(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        debug!(
            model = %self.model,
            voice = %self.voice,
            chars = text.len(),
            "Synthesis request"
        );

        let url = format!("{}/v1/audio/speech", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": self.format,
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MentorError::Synthesis(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MentorError::Synthesis(format!("HTTP {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MentorError::Synthesis(format!("Failed to read audio body: {e}")))?;

        if bytes.is_empty() {
            return Err(MentorError::Synthesis(
                "Server returned empty audio".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Test doubles
// =============================================================================

/// Synthesizer double that returns deterministic bytes derived from the text.
#[derive(Debug, Clone, Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(MentorError::Synthesis(
                "Cannot synthesize empty text".to_string(),
            ));
        }
        Ok(format!("AUDIO:{}", text).into_bytes())
    }
}

/// Synthesizer double that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(MentorError::Synthesis(
            "synthesis backend unavailable".to_string(),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
