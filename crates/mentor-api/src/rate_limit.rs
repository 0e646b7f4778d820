//! Per-client request rate limiting.
//!
//! Requests are counted in one-second fixed windows keyed by client
//! address, so one chatty client cannot starve the others on a shared
//! deployment. Over-limit requests get the standard JSON error body.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Stale windows are swept once the client map grows past this.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: u64,
    used: u64,
}

/// Fixed one-second request windows, one per client key.
#[derive(Clone)]
pub struct RateLimiter {
    /// Requests each client may make per window.
    allowance: u64,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(allowance: u64) -> Self {
        Self {
            allowance,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record one request for `client` and report whether it fits the
    /// client's current window.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, epoch_secs())
    }

    fn check_at(&self, client: &str, now: u64) -> bool {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, window| window.started_at == now);
        }

        let window = windows.entry(client.to_string()).or_insert(Window {
            started_at: now,
            used: 0,
        });
        if window.started_at != now {
            window.started_at = now;
            window.used = 0;
        }
        window.used += 1;
        window.used <= self.allowance
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The client key for a request.
///
/// Behind a proxy the first `X-Forwarded-For` hop identifies the client;
/// direct connections share one key.
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .unwrap_or_else(|| "direct".to_string())
}

/// Axum middleware that enforces the per-client rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if limiter.check(&client) {
        next.run(req).await
    } else {
        ApiError::RateLimited(format!("Request rate limit exceeded for {}", client))
            .into_response()
    }
}
