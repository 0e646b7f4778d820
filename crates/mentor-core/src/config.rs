use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MentorError, Result};

/// Top-level configuration for the Mentor application.
///
/// Loaded from `~/.mentor/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            speech: SpeechConfig::default(),
            session: SessionConfig::default(),
            chat: ChatConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl MentorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MentorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MentorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_default();
        if !home.is_empty() {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for SQLite, documents, and synthesized audio.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.mentor/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Public base URL used to build absolute audio links,
    /// e.g. "http://localhost:5505".
    pub public_base_url: String,
    /// Directory where synthesized audio artifacts are written and served.
    pub audio_dir: String,
    /// Maximum accepted request body size in bytes (audio uploads).
    pub max_upload_bytes: usize,
    /// Maximum requests per second before 429 responses.
    pub rate_limit_per_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5505,
            public_base_url: "http://localhost:5505".to_string(),
            audio_dir: "~/.mentor/data/audio".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            rate_limit_per_sec: 20,
        }
    }
}

/// Completion collaborator configuration (Ollama-compatible chat API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the model server, e.g. "http://localhost:11434".
    pub base_url: String,
    /// Model name passed in each request.
    pub model: String,
    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries after a transient failure (0 disables retrying).
    pub max_retries: u32,
    /// First backoff delay in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: u64,
    /// Random jitter fraction applied to each delay (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            request_timeout_secs: 60,
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            jitter: 0.2,
        }
    }
}

/// Document retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory of plain-text/markdown documents indexed at startup.
    pub docs_dir: String,
    /// Number of context chunks returned per query.
    pub top_k: usize,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Embedding dimension.
    pub embedding_dim: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            docs_dir: "~/.mentor/data/docs".to_string(),
            top_k: 3,
            chunk_size: 1000,
            chunk_overlap: 20,
            embedding_dim: 384,
        }
    }
}

/// Speech collaborator configuration (transcription and synthesis).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Synthesis scheduling: "background" (respond before the file exists)
    /// or "sync" (synthesize before responding).
    pub mode: String,
    /// Base URL of the text-to-speech server.
    pub tts_base_url: String,
    /// Text-to-speech model name.
    pub tts_model: String,
    /// Voice identifier.
    pub tts_voice: String,
    /// Audio container format and artifact file extension.
    pub audio_format: String,
    /// Base URL of the speech-to-text server.
    pub stt_base_url: String,
    /// Speech-to-text model name.
    pub stt_model: String,
    /// Per-call timeout in seconds for both speech services.
    pub request_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            mode: "background".to_string(),
            tts_base_url: "http://localhost:8880".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "onyx".to_string(),
            audio_format: "mp3".to_string(),
            stt_base_url: "http://localhost:8000".to_string(),
            stt_model: "whisper-1".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Messages of history replayed into the completion collaborator.
    pub max_history_messages: usize,
    /// Idle minutes after which a session is dropped.
    pub session_ttl_minutes: i64,
    /// Maximum live sessions before least-recently-used eviction.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_messages: 10,
            session_ttl_minutes: 30,
            max_sessions: 1000,
        }
    }
}

/// Conversation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Follow-up suggestions returned by the default-suggestion endpoint.
    pub max_suggestions: usize,
    /// Topics sampled when building default suggestions.
    pub topics: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 4,
            topics: default_topics(),
        }
    }
}

fn default_topics() -> Vec<String> {
    [
        "business model canvas",
        "startup funding",
        "market research",
        "product development",
        "customer acquisition",
        "scaling strategies",
        "pitch deck creation",
        "financial planning",
        "team building",
        "competitive analysis",
        "intellectual property",
        "business registration",
        "marketing strategies",
        "sales techniques",
        "investor relations",
        "bootstrapping",
        "venture capital",
        "angel investing",
        "business plan development",
        "minimum viable product",
        "user experience",
        "customer feedback",
        "pivot strategies",
        "exit strategies",
        "business valuation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Audit storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether completed turns are persisted to SQLite.
    pub enabled: bool,
    /// Database file path.
    pub db_path: String,
    /// User the audit rows are attributed to.
    pub default_username: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: "~/.mentor/data/mentor.db".to_string(),
            default_username: "default_user".to_string(),
        }
    }
}
