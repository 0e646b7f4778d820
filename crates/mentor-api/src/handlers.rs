//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, invokes the
//! orchestrator or a collaborator, and returns JSON responses. All
//! nontrivial logic lives below this layer.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use mentor_chat::{default_suggestions, SessionSummary};
use mentor_core::types::ChatMessage;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    /// The mentor's answer, also used as the synthesis text.
    pub response: String,
    /// Follow-up suggestions parsed from the completion.
    pub suggestions: Vec<String>,
    /// Absolute URL of the synthesized audio, absent when synthesis was
    /// skipped or failed.
    pub audio_url: Option<String>,
    /// The session the turn was recorded under (server-generated when
    /// the request carried none).
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /ask - run one mentoring turn for a text question.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let query = request.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Field 'query' is required and must not be empty".to_string(),
        ));
    }

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let outcome = state.orchestrator.handle_turn(&session_id, &query).await?;

    let audio_url = state
        .coordinator
        .schedule(&outcome.answer.main_text)
        .await
        .map(|artifact| artifact.url);

    state.audit_turn(
        query.trim(),
        &outcome.answer.main_text,
        &outcome.answer.suggestions,
    );

    Ok(Json(AskResponse {
        response: outcome.answer.main_text,
        suggestions: outcome.answer.suggestions,
        audio_url,
        session_id,
    }))
}

/// POST /whisper - transcribe an uploaded audio file.
pub async fn whisper(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("audio.webm").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::BadRequest(
                "Uploaded audio file is empty".to_string(),
            ));
        }

        debug!(file = %file_name, bytes = data.len(), "Transcribing upload");

        let transcription = state
            .transcriber
            .transcribe(data.to_vec(), &file_name)
            .await
            .map_err(|e| ApiError::Internal(format!("Transcription failed: {}", e)))?;

        return Ok(Json(TranscriptionResponse { transcription }));
    }

    Err(ApiError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// GET /suggestions - topic-based defaults for seeding a UI before the
/// first turn.
pub async fn suggestions(State(state): State<AppState>) -> Json<SuggestionsResponse> {
    let chat = &state.config.chat;
    Json(SuggestionsResponse {
        suggestions: default_suggestions(&chat.topics, chat.max_suggestions),
    })
}

/// GET /sessions - live sessions, most recently active first.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.orchestrator.sessions().list(),
    })
}

/// GET /sessions/{id}/history - ordered messages for one session.
pub async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state
        .orchestrator
        .sessions()
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown session '{}'", id)))?;

    Ok(Json(HistoryResponse {
        session_id: id,
        messages: session.history_snapshot().await,
    }))
}

/// DELETE /sessions/{id} - drop a session and its history.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if state.orchestrator.sessions().remove(&id) {
        Ok(Json(DeletedResponse { deleted: id }))
    } else {
        Err(ApiError::NotFound(format!("Unknown session '{}'", id)))
    }
}

/// GET /health - liveness and basic stats.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.sessions().len(),
    })
}
