//! Speech-to-text service trait and implementations.
//!
//! `HttpTranscriber` posts uploaded audio to an OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint as a multipart form and extracts
//! the transcribed text from the JSON response.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mentor_core::config::SpeechConfig;
use mentor_core::error::{MentorError, Result};

// =============================================================================
// Trait
// =============================================================================

/// Service for transcribing uploaded audio to text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes into text.
    ///
    /// `file_name` is used to derive the content type for the upload
    /// (e.g. "voice.webm").
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;
}

/// Derive the upload MIME type from a file name extension.
fn mime_for_file(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        _ => "audio/wav",
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// Transcription client for OpenAI-compatible speech-to-text servers.
pub struct HttpTranscriber {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpTranscriber {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                MentorError::Transcription(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.stt_base_url.trim_end_matches('/').to_string(),
            model: config.stt_model.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(MentorError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        debug!(
            model = %self.model,
            size = audio.len(),
            file_name = %file_name,
            "Transcription request"
        );

        let mime = mime_for_file(file_name);
        let file_part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| MentorError::Transcription(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone());

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MentorError::Transcription(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MentorError::Transcription(format!("HTTP {status}: {body}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MentorError::Transcription(format!("Invalid response: {e}")))?;

        json["text"]
            .as_str()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| {
                MentorError::Transcription("no 'text' field in response".to_string())
            })
    }
}

// =============================================================================
// Test doubles
// =============================================================================

/// Transcriber double that returns a fixed transcription.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    text: String,
}

impl MockTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new("[mock transcription]")
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, _file_name: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(MentorError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }
        Ok(self.text.clone())
    }
}

/// Transcriber double that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> Result<String> {
        Err(MentorError::Transcription(
            "transcription backend unavailable".to_string(),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
