//! Mentor speech crate - transcription, synthesis, and audio scheduling.
//!
//! Wraps OpenAI-compatible speech servers behind `Transcriber` and
//! `Synthesizer` traits, and coordinates writing synthesized replies to
//! the served audio directory either before or after the HTTP response
//! goes out.

pub mod coordinator;
pub mod synthesize;
pub mod transcribe;

pub use coordinator::{AudioArtifact, AudioJobCoordinator, SynthesisMode};
pub use synthesize::{FailingSynthesizer, HttpSynthesizer, MockSynthesizer, Synthesizer};
pub use transcribe::{FailingTranscriber, HttpTranscriber, MockTranscriber, Transcriber};
