//! Retry policy and backoff calculation for the completion client.
//!
//! Exponential backoff with symmetric jitter. Only the delay math lives
//! here; the retry loop itself is in the Ollama client.

use rand::Rng;

use mentor_core::config::LlmConfig;

/// Parameters governing retries after transient completion failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 disables retrying).
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms.
    pub max_delay_ms: u64,
    /// Jitter fraction 0.0 to 1.0.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }

    /// Delay in ms before the retry with the given zero-based index.
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let mut rng = rand::rng();
        backoff_delay(
            retry,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter,
            rng.random::<f64>(),
        )
    }
}

/// Calculate exponential backoff delay with explicit randomness.
///
/// Formula: `min(max_delay, base_delay * 2^retry) * (1 + (random*2 - 1) * jitter)`
///
/// The jitter is applied symmetrically: a factor of 0.2 means the delay
/// varies by up to 20% either side of the capped exponential value.
/// `random` should be a value in `[0.0, 1.0)`.
pub fn backoff_delay(
    retry: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << retry.min(31));
    let capped = exponential.min(max_delay_ms);

    // Maps random [0,1) to [-jitter, +jitter]
    let factor = 1.0 + (random * 2.0 - 1.0) * jitter;
    ((capped as f64) * factor).round().max(0.0) as u64
}
