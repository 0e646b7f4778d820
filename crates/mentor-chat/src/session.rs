//! Session state.
//!
//! Conversation history lives behind two locks: an outer map lock that
//! only guards session lookup, and an inner per-session lock held across
//! a whole turn so turns within one session never interleave. Different
//! sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use mentor_core::config::SessionConfig;
use mentor_core::types::ChatMessage;

// =============================================================================
// Session
// =============================================================================

/// One conversation and its rolling history window.
///
/// Metadata is atomic so listing and eviction never contend with the
/// history lock a turn may be holding.
pub struct Session {
    /// Caller-supplied or generated identifier.
    pub id: String,
    /// Creation time, epoch seconds.
    pub created_at: i64,
    last_message_at: AtomicI64,
    turn_count: AtomicU64,
    history: AsyncMutex<Vec<ChatMessage>>,
}

impl Session {
    fn new(id: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: id.to_string(),
            created_at: now,
            last_message_at: AtomicI64::new(now),
            turn_count: AtomicU64::new(0),
            history: AsyncMutex::new(Vec::new()),
        }
    }

    /// Lock the history for the duration of a turn.
    pub async fn lock_history(&self) -> tokio::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.history.lock().await
    }

    /// Append one completed turn through the caller's history guard and
    /// trim the window to `max_history` messages.
    pub fn record_turn(
        &self,
        history: &mut Vec<ChatMessage>,
        question: &str,
        reply: &str,
        max_history: usize,
    ) {
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(reply));
        if history.len() > max_history {
            history.drain(..history.len() - max_history);
        }
        self.last_message_at
            .store(Utc::now().timestamp(), Ordering::Relaxed);
        self.turn_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Clone the current history.
    pub async fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    pub fn last_message_at(&self) -> i64 {
        self.last_message_at.load(Ordering::Relaxed)
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count.load(Ordering::Relaxed)
    }

    /// Whether the session has been idle past the TTL. A non-positive
    /// TTL disables expiry.
    pub fn is_expired(&self, ttl_minutes: i64) -> bool {
        if ttl_minutes <= 0 {
            return false;
        }
        Utc::now().timestamp() - self.last_message_at() > ttl_minutes * 60
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            last_message_at: self.last_message_at(),
            turn_count: self.turn_count(),
        }
    }
}

/// Snapshot of one session for the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: i64,
    pub last_message_at: i64,
    pub turn_count: u64,
}

// =============================================================================
// SessionStore
// =============================================================================

/// Maps session identifiers to live sessions.
///
/// Absent keys are created on reference, never an error. Expired
/// sessions are dropped on access, and when the map is full the
/// least-recently-used session is evicted to make room.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    max_history_messages: usize,
    session_ttl_minutes: i64,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_history_messages: usize, session_ttl_minutes: i64, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history_messages,
            session_ttl_minutes,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.max_history_messages,
            config.session_ttl_minutes,
            config.max_sessions,
        )
    }

    /// History window applied when recording turns.
    pub fn max_history_messages(&self) -> usize {
        self.max_history_messages
    }

    /// Fetch the session for `id`, creating a fresh one if the id is
    /// unseen or its previous session expired.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        let mut map = self.lock_map();

        let stale = map
            .get(id)
            .map(|session| session.is_expired(self.session_ttl_minutes))
            .unwrap_or(false);
        if stale {
            map.remove(id);
            debug!(session = %id, "Dropped expired session");
        }

        if let Some(existing) = map.get(id) {
            return existing.clone();
        }

        self.prune_expired(&mut map);

        // An evicted session that is mid-turn stays alive through its Arc
        // until the turn completes; only the map entry goes away.
        while map.len() >= self.max_sessions {
            let oldest = map
                .iter()
                .min_by_key(|(_, session)| session.last_message_at())
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest_id) => {
                    map.remove(&oldest_id);
                    warn!(session = %oldest_id, "Evicted least-recently-used session");
                }
                None => break,
            }
        }

        let session = Arc::new(Session::new(id));
        map.insert(id.to_string(), session.clone());
        debug!(session = %id, "Created session");
        session
    }

    /// Fetch an existing, unexpired session without creating one.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let mut map = self.lock_map();

        let stale = map
            .get(id)
            .map(|session| session.is_expired(self.session_ttl_minutes))
            .unwrap_or(false);
        if stale {
            map.remove(id);
            debug!(session = %id, "Dropped expired session");
            return None;
        }

        map.get(id).cloned()
    }

    /// Drop a session. Returns false when the id is unknown.
    pub fn remove(&self, id: &str) -> bool {
        self.lock_map().remove(id).is_some()
    }

    /// Summaries of all live sessions, most recently active first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .lock_map()
            .values()
            .map(|session| session.summary())
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        summaries
    }

    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_map().is_empty()
    }

    // -- Private helpers --

    fn prune_expired(&self, map: &mut HashMap<String, Arc<Session>>) {
        if self.session_ttl_minutes <= 0 {
            return;
        }
        let before = map.len();
        map.retain(|_, session| !session.is_expired(self.session_ttl_minutes));
        let dropped = before - map.len();
        if dropped > 0 {
            debug!(dropped, "Pruned expired sessions");
        }
    }

    fn lock_map(&self) -> MutexGuard<'_, HashMap<String, Arc<Session>>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            // A poisoned lock only means another thread panicked while
            // holding it; the map itself is still usable.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> SessionStore {
        SessionStore::new(10, 30, 100)
    }

    // ---- Creation and lookup ----

    #[test]
    fn test_new_store_is_empty() {
        let store = make_store();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_get_or_create_creates_once() {
        let store = make_store();
        let first = store.get_or_create("alpha");
        let second = store.get_or_create("alpha");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_does_not_create() {
        let store = make_store();
        assert!(store.get("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_returns_existing() {
        let store = make_store();
        let created = store.get_or_create("alpha");
        let fetched = store.get("alpha").unwrap();
        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[test]
    fn test_remove() {
        let store = make_store();
        store.get_or_create("alpha");
        assert!(store.remove("alpha"));
        assert!(!store.remove("alpha"));
        assert!(store.is_empty());
    }

    // ---- Recording turns ----

    #[tokio::test]
    async fn test_record_turn_appends_pair() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        let mut history = session.lock_history().await;
        session.record_turn(&mut history, "How do I start?", "Start lean.", 10);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "How do I start?");
        assert_eq!(history[1].content, "Start lean.");
        assert_eq!(session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_record_turn_updates_last_message_at() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        session.last_message_at.store(0, Ordering::Relaxed);

        let mut history = session.lock_history().await;
        session.record_turn(&mut history, "q", "a", 10);
        assert!(session.last_message_at() > 0);
    }

    #[tokio::test]
    async fn test_history_window_trims_oldest() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        let mut history = session.lock_history().await;
        session.record_turn(&mut history, "q1", "a1", 4);
        session.record_turn(&mut history, "q2", "a2", 4);
        session.record_turn(&mut history, "q3", "a3", 4);

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q2");
        assert_eq!(history[3].content, "a3");
        assert_eq!(session.turn_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_history_window() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        let mut history = session.lock_history().await;
        session.record_turn(&mut history, "q", "a", 0);

        assert!(history.is_empty());
        assert_eq!(session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_session_isolation() {
        let store = make_store();
        let alpha = store.get_or_create("alpha");
        {
            let mut history = alpha.lock_history().await;
            alpha.record_turn(&mut history, "q", "a", 10);
        }

        let beta = store.get_or_create("beta");
        assert!(beta.history_snapshot().await.is_empty());
        assert_eq!(alpha.history_snapshot().await.len(), 2);
    }

    // ---- Expiry ----

    #[test]
    fn test_fresh_session_not_expired() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        assert!(!session.is_expired(30));
    }

    #[test]
    fn test_idle_session_expires() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        session
            .last_message_at
            .store(Utc::now().timestamp() - 31 * 60, Ordering::Relaxed);
        assert!(session.is_expired(30));
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        session
            .last_message_at
            .store(Utc::now().timestamp() - 30 * 60, Ordering::Relaxed);
        assert!(!session.is_expired(30));
    }

    #[test]
    fn test_non_positive_ttl_disables_expiry() {
        let store = SessionStore::new(10, 0, 100);
        let session = store.get_or_create("alpha");
        session.last_message_at.store(0, Ordering::Relaxed);
        assert!(store.get("alpha").is_some());
    }

    #[test]
    fn test_expired_session_dropped_on_get() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        session
            .last_message_at
            .store(Utc::now().timestamp() - 60 * 60, Ordering::Relaxed);

        assert!(store.get("alpha").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_replaced_on_get_or_create() {
        let store = make_store();
        let old = store.get_or_create("alpha");
        {
            let mut history = old.lock_history().await;
            old.record_turn(&mut history, "q", "a", 10);
        }
        old.last_message_at
            .store(Utc::now().timestamp() - 60 * 60, Ordering::Relaxed);

        let fresh = store.get_or_create("alpha");
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert!(fresh.history_snapshot().await.is_empty());
        assert_eq!(store.len(), 1);
    }

    // ---- Eviction ----

    #[test]
    fn test_lru_eviction_at_capacity() {
        let store = SessionStore::new(10, 30, 2);
        let alpha = store.get_or_create("alpha");
        let beta = store.get_or_create("beta");
        alpha.last_message_at.store(100, Ordering::Relaxed);
        beta.last_message_at.store(50, Ordering::Relaxed);

        store.get_or_create("gamma");

        assert_eq!(store.len(), 2);
        assert!(store.get("alpha").is_some());
        assert!(store.get("beta").is_none());
        assert!(store.get("gamma").is_some());
    }

    #[test]
    fn test_existing_session_not_evicted_on_access() {
        let store = SessionStore::new(10, 30, 2);
        store.get_or_create("alpha");
        store.get_or_create("beta");
        store.get_or_create("alpha");
        assert_eq!(store.len(), 2);
        assert!(store.get("alpha").is_some());
        assert!(store.get("beta").is_some());
    }

    #[test]
    fn test_capacity_one() {
        let store = SessionStore::new(10, 30, 1);
        store.get_or_create("alpha");
        store.get_or_create("beta");
        assert_eq!(store.len(), 1);
        assert!(store.get("alpha").is_none());
        assert!(store.get("beta").is_some());
    }

    // ---- Listing ----

    #[test]
    fn test_list_sorted_by_recency() {
        let store = make_store();
        store.get_or_create("a").last_message_at.store(10, Ordering::Relaxed);
        store.get_or_create("b").last_message_at.store(30, Ordering::Relaxed);
        store.get_or_create("c").last_message_at.store(20, Ordering::Relaxed);

        let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_summary_reflects_turns() {
        let store = make_store();
        let session = store.get_or_create("alpha");
        {
            let mut history = session.lock_history().await;
            session.record_turn(&mut history, "q", "a", 10);
        }

        let summary = session.summary();
        assert_eq!(summary.id, "alpha");
        assert_eq!(summary.turn_count, 1);
        assert!(summary.created_at > 0);
    }
}
