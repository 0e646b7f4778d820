//! Audio artifact naming and synthesis scheduling.
//!
//! Every spoken reply gets a unique file name under the served audio
//! directory. In background mode the HTTP response returns the audio URL
//! before the file exists; clients poll or retry the URL. In sync mode
//! the file is written before the response goes out.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use mentor_core::config::SpeechConfig;
use mentor_core::error::Result;

use crate::synthesize::Synthesizer;

/// When synthesized audio is written relative to the HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    /// Synthesize and write the file before responding.
    Sync,
    /// Respond immediately; synthesize on a spawned task.
    Background,
}

impl SynthesisMode {
    /// Parse a mode string from configuration. Unknown values fall back
    /// to background mode.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "sync" => SynthesisMode::Sync,
            "background" => SynthesisMode::Background,
            other => {
                warn!("Unknown synthesis mode {:?}, using background", other);
                SynthesisMode::Background
            }
        }
    }
}

/// A named audio file and the public URL it is served under.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// File name, e.g. "response_1712345678901_0.mp3".
    pub file_name: String,
    /// Absolute URL clients fetch the audio from.
    pub url: String,
    /// Filesystem path the audio is written to.
    pub path: PathBuf,
}

/// Schedules synthesis jobs and allocates unique artifact names.
pub struct AudioJobCoordinator {
    synthesizer: Arc<dyn Synthesizer>,
    audio_dir: PathBuf,
    public_base_url: String,
    format: String,
    mode: SynthesisMode,
    counter: AtomicU64,
}

impl AudioJobCoordinator {
    /// Create a coordinator writing into `audio_dir`.
    ///
    /// The directory is created if it does not exist.
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        config: &SpeechConfig,
        audio_dir: PathBuf,
        public_base_url: &str,
    ) -> Result<Self> {
        std::fs::create_dir_all(&audio_dir)?;

        Ok(Self {
            synthesizer,
            audio_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            format: config.audio_format.clone(),
            mode: SynthesisMode::parse(&config.mode),
            counter: AtomicU64::new(0),
        })
    }

    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    /// Allocate the next artifact name and URL.
    ///
    /// The process-lifetime counter keeps names unique even when two
    /// replies land within the same millisecond.
    fn next_artifact(&self) -> AudioArtifact {
        let epoch_ms = Utc::now().timestamp_millis();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("response_{}_{}.{}", epoch_ms, seq, self.format);
        let url = format!("{}/static/audio/{}", self.public_base_url, file_name);
        let path = self.audio_dir.join(&file_name);

        AudioArtifact {
            file_name,
            url,
            path,
        }
    }

    /// Schedule synthesis of the given reply text.
    ///
    /// Returns `None` without scheduling anything when the text is empty,
    /// or when sync-mode synthesis fails. Synthesis failures never fail
    /// the surrounding turn.
    pub async fn schedule(&self, text: &str) -> Option<AudioArtifact> {
        if text.trim().is_empty() {
            debug!("Skipping synthesis of empty reply text");
            return None;
        }

        let artifact = self.next_artifact();

        match self.mode {
            SynthesisMode::Sync => {
                match synthesize_to_file(&self.synthesizer, text, &artifact).await {
                    Ok(()) => Some(artifact),
                    Err(e) => {
                        warn!(error = %e, "Synthesis failed, responding without audio");
                        None
                    }
                }
            }
            SynthesisMode::Background => {
                let synthesizer = Arc::clone(&self.synthesizer);
                let text = text.to_string();
                let task_artifact = artifact.clone();
                tokio::spawn(async move {
                    if let Err(e) = synthesize_to_file(&synthesizer, &text, &task_artifact).await
                    {
                        warn!(
                            file = %task_artifact.file_name,
                            error = %e,
                            "Background synthesis failed"
                        );
                    }
                });
                Some(artifact)
            }
        }
    }
}

async fn synthesize_to_file(
    synthesizer: &Arc<dyn Synthesizer>,
    text: &str,
    artifact: &AudioArtifact,
) -> Result<()> {
    let bytes = synthesizer.synthesize(text).await?;
    tokio::fs::write(&artifact.path, &bytes).await?;
    debug!(
        file = %artifact.file_name,
        bytes = bytes.len(),
        "Audio artifact written"
    );
    Ok(())
}
