//! Integration tests for the Mentor API.
//!
//! Exercises every endpoint through `tower::ServiceExt::oneshot` with
//! deterministic collaborators: scripted completions, an empty retriever,
//! mock speech services, and an in-memory audit database.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use mentor_api::handlers::{
    AskResponse, HealthResponse, SuggestionsResponse, TranscriptionResponse,
};
use mentor_api::state::{AppState, AuditLog};
use mentor_api::create_router;
use mentor_chat::{MentorOrchestrator, SessionStore, APOLOGY_REPLY};
use mentor_core::config::MentorConfig;
use mentor_llm::{CompletionService, FailingCompletion, ScriptedCompletion};
use mentor_retrieval::StaticRetriever;
use mentor_speech::{
    AudioJobCoordinator, FailingTranscriber, MockSynthesizer, MockTranscriber, Transcriber,
};
use mentor_storage::Database;

// =============================================================================
// Helpers
// =============================================================================

/// A router plus the tempdir its audio artifacts land in.
struct TestBackend {
    state: AppState,
    audio_dir: tempfile::TempDir,
}

impl TestBackend {
    fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}

fn make_backend_from(
    mut config: MentorConfig,
    completion: Arc<dyn CompletionService>,
    transcriber: Arc<dyn Transcriber>,
) -> TestBackend {
    let audio_dir = tempfile::tempdir().unwrap();
    config.server.audio_dir = audio_dir.path().to_string_lossy().to_string();
    // Sync mode keeps the artifact on disk before the response goes out.
    config.speech.mode = "sync".to_string();

    let orchestrator = Arc::new(MentorOrchestrator::new(
        completion,
        Arc::new(StaticRetriever::empty()),
        Arc::new(SessionStore::from_config(&config.session)),
        Duration::from_secs(5),
    ));
    let coordinator = Arc::new(
        AudioJobCoordinator::new(
            Arc::new(MockSynthesizer::new()),
            &config.speech,
            audio_dir.path().to_path_buf(),
            &config.server.public_base_url,
        )
        .unwrap(),
    );
    let audit = AuditLog::new(Arc::new(Database::in_memory().unwrap()), "default_user");

    let state = AppState::new(config, orchestrator, coordinator, transcriber, Some(audit));
    TestBackend { state, audio_dir }
}

fn make_backend_with(
    completion: Arc<dyn CompletionService>,
    transcriber: Arc<dyn Transcriber>,
) -> TestBackend {
    make_backend_from(MentorConfig::default(), completion, transcriber)
}

fn make_backend(responses: Vec<&str>) -> TestBackend {
    make_backend_with(
        Arc::new(ScriptedCompletion::new(responses)),
        Arc::new(MockTranscriber::new("How do I start a business?")),
    )
}

fn ask_request(json: &str) -> Request<Body> {
    Request::post("/ask")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let boundary = "mentor-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

const COMPLETION_WITH_PROMPTS: &str = "Start lean.\n\nNext Interaction Prompts:\n\
    1. How do I validate demand?\n2. What pricing model fits?\n";

// =============================================================================
// /health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.active_sessions, 0);
}

// =============================================================================
// /ask
// =============================================================================

#[tokio::test]
async fn test_ask_happy_path() {
    let backend = make_backend(vec![COMPLETION_WITH_PROMPTS]);
    let resp = backend
        .router()
        .oneshot(ask_request(r#"{"query": "How do I start a business?"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let ask: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(ask.response, "Start lean.");
    assert_eq!(
        ask.suggestions,
        vec!["How do I validate demand?", "What pricing model fits?"]
    );
    assert!(!ask.session_id.is_empty());

    let audio_url = ask.audio_url.expect("sync mode returns a resolved URL");
    assert!(audio_url.contains("/static/audio/response_"));
    // The artifact exists on disk before the response returned.
    assert_eq!(
        std::fs::read_dir(backend.audio_dir.path()).unwrap().count(),
        1
    );
}

#[tokio::test]
async fn test_ask_serves_synthesized_audio() {
    let backend = make_backend(vec!["Spoken answer."]);
    let router = backend.router();

    let resp = router
        .clone()
        .oneshot(ask_request(r#"{"query": "Say something"}"#))
        .await
        .unwrap();
    let ask: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();

    let url = ask.audio_url.unwrap();
    let path = url
        .split_once("/static/audio/")
        .map(|(_, file)| format!("/static/audio/{}", file))
        .unwrap();

    let audio_resp = router
        .oneshot(Request::get(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(audio_resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(audio_resp).await, b"AUDIO:Spoken answer.");
}

#[tokio::test]
async fn test_ask_reuses_supplied_session() {
    let backend = make_backend(vec![
        "First answer.",
        "Standalone follow-up question?",
        "Second answer.",
    ]);
    let router = backend.router();

    let resp = router
        .clone()
        .oneshot(ask_request(
            r#"{"query": "First question", "session_id": "my-session"}"#,
        ))
        .await
        .unwrap();
    let first: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(first.session_id, "my-session");

    let resp = router
        .clone()
        .oneshot(ask_request(
            r#"{"query": "Follow up", "session_id": "my-session"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Both turns landed in the one session.
    let resp = router
        .oneshot(
            Request::get("/sessions/my-session/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let history = json_body(resp).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_ask_generates_session_when_absent() {
    let backend = make_backend(vec!["Answer one.", "Answer two."]);
    let router = backend.router();

    let resp = router
        .clone()
        .oneshot(ask_request(r#"{"query": "one"}"#))
        .await
        .unwrap();
    let first: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();

    let resp = router
        .oneshot(ask_request(r#"{"query": "two"}"#))
        .await
        .unwrap();
    let second: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();

    // Two requests without ids get two distinct sessions.
    assert_ne!(first.session_id, second.session_id);
}

#[tokio::test]
async fn test_ask_empty_query_rejected() {
    let backend = make_backend(vec!["unused"]);
    let resp = backend
        .router()
        .oneshot(ask_request(r#"{"query": "   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "bad_request");

    // No session was touched and no audio job was scheduled.
    assert!(backend.state.orchestrator.sessions().is_empty());
    assert_eq!(
        std::fs::read_dir(backend.audio_dir.path()).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_ask_missing_query_field_rejected() {
    let backend = make_backend(vec!["unused"]);
    let resp = backend
        .router()
        .oneshot(ask_request(r#"{"session_id": "abc"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_degrades_to_apology_on_completion_failure() {
    let backend = make_backend_with(
        Arc::new(FailingCompletion::new("model offline")),
        Arc::new(MockTranscriber::new("unused")),
    );
    let resp = backend
        .router()
        .oneshot(ask_request(r#"{"query": "Anything", "session_id": "s1"}"#))
        .await
        .unwrap();

    // Collaborator failure is a degraded 200, not a 5xx.
    assert_eq!(resp.status(), StatusCode::OK);
    let ask: AskResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(ask.response, APOLOGY_REPLY);
    assert!(ask.suggestions.is_empty());
    // The apology itself gets audio.
    assert!(ask.audio_url.is_some());

    // And the turn is still in session history.
    let session = backend.state.orchestrator.sessions().get("s1").unwrap();
    assert_eq!(session.history_snapshot().await.len(), 2);
}

#[tokio::test]
async fn test_ask_appends_audit_row() {
    let backend = make_backend(vec![COMPLETION_WITH_PROMPTS]);
    backend
        .router()
        .oneshot(ask_request(r#"{"query": "How do I start?"}"#))
        .await
        .unwrap();

    let audit = backend.state.audit.as_ref().unwrap();
    assert_eq!(audit.turn_count().unwrap(), 1);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_exhausted_rate_limit_is_429() {
    let mut config = MentorConfig::default();
    // A zero allowance denies every request in every window.
    config.server.rate_limit_per_sec = 0;
    let backend = make_backend_from(
        config,
        Arc::new(ScriptedCompletion::new(vec!["unused"])),
        Arc::new(MockTranscriber::new("unused")),
    );
    let router = backend.router();

    let resp = router
        .clone()
        .oneshot(ask_request(r#"{"query": "anything"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "too_many_requests");

    // /health sits outside the rate-limited routes.
    let resp = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// /whisper
// =============================================================================

#[tokio::test]
async fn test_whisper_happy_path() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(multipart_request(
            "/whisper",
            "file",
            "voice.webm",
            b"fake-audio-bytes",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let out: TranscriptionResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(out.transcription, "How do I start a business?");
}

#[tokio::test]
async fn test_whisper_missing_file_field() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(multipart_request(
            "/whisper",
            "not_file",
            "voice.webm",
            b"bytes",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whisper_empty_upload_rejected() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(multipart_request("/whisper", "file", "voice.webm", b""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whisper_transcriber_failure_is_500() {
    let backend = make_backend_with(
        Arc::new(ScriptedCompletion::new(vec![])),
        Arc::new(FailingTranscriber),
    );
    let resp = backend
        .router()
        .oneshot(multipart_request(
            "/whisper",
            "file",
            "voice.webm",
            b"fake-audio-bytes",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Transcription failed"));
}

// =============================================================================
// /suggestions
// =============================================================================

#[tokio::test]
async fn test_suggestions_default_count() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(Request::get("/suggestions").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let out: SuggestionsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(out.suggestions.len(), 4);
    for suggestion in &out.suggestions {
        assert!(suggestion.ends_with('?'), "not a question: {}", suggestion);
    }
}

// =============================================================================
// Session management
// =============================================================================

#[tokio::test]
async fn test_sessions_list_after_turns() {
    let backend = make_backend(vec!["a1", "a2"]);
    let router = backend.router();

    router
        .clone()
        .oneshot(ask_request(r#"{"query": "q", "session_id": "alpha"}"#))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(ask_request(r#"{"query": "q", "session_id": "beta"}"#))
        .await
        .unwrap();

    let resp = router
        .oneshot(Request::get("/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_session_history_shape() {
    let backend = make_backend(vec!["The reply."]);
    let router = backend.router();

    router
        .clone()
        .oneshot(ask_request(r#"{"query": "The question", "session_id": "s"}"#))
        .await
        .unwrap();

    let resp = router
        .oneshot(
            Request::get("/sessions/s/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["session_id"], "s");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "The question");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "The reply.");
}

#[tokio::test]
async fn test_session_history_unknown_404() {
    let backend = make_backend(vec![]);
    let resp = backend
        .router()
        .oneshot(
            Request::get("/sessions/ghost/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_delete_session() {
    let backend = make_backend(vec!["a"]);
    let router = backend.router();

    router
        .clone()
        .oneshot(ask_request(r#"{"query": "q", "session_id": "doomed"}"#))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(
            Request::delete("/sessions/doomed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Deleting again is a 404.
    let resp = router
        .oneshot(
            Request::delete("/sessions/doomed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(backend.state.orchestrator.sessions().is_empty());
}
