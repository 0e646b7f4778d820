//! Mentor application binary - composition root.
//!
//! Ties together all Mentor crates into a single executable:
//! 1. Load configuration from TOML (with CLI overrides)
//! 2. Initialize audit storage (SQLite)
//! 3. Index the mentoring document corpus for retrieval
//! 4. Build the completion and speech collaborators
//! 5. Start the axum REST API server

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use mentor_api::state::{AppState, AuditLog};
use mentor_api::create_router;
use mentor_chat::{MentorOrchestrator, SessionStore};
use mentor_core::config::{expand_home, MentorConfig};
use mentor_llm::OllamaClient;
use mentor_retrieval::CorpusRetriever;
use mentor_speech::{AudioJobCoordinator, HttpSynthesizer, HttpTranscriber};
use mentor_storage::Database;

mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config loads before tracing is up; its own load-time logs are lost,
    // so the chosen path is logged again below.
    let config_file = args.resolve_config_path();
    let mut config = MentorConfig::load_or_default(&config_file);

    // CLI overrides.
    config.server.port = args.resolve_port(config.server.port);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir.clone();
        config.storage.db_path = format!("{}/mentor.db", data_dir);
        config.server.audio_dir = format!("{}/audio", data_dir);
        config.retrieval.docs_dir = format!("{}/docs", data_dir);
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing. RUST_LOG wins over the resolved level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Mentor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    // Audit storage.
    let audit = if config.storage.enabled {
        let db_path = expand_home(&config.storage.db_path);
        let db = Database::new(&db_path)?;
        tracing::info!(path = %db_path.display(), "SQLite audit database opened");
        Some(AuditLog::new(
            Arc::new(db),
            &config.storage.default_username,
        ))
    } else {
        tracing::info!("Audit storage disabled in config");
        None
    };

    // Document retrieval. A missing corpus directory is not fatal; the
    // mentor answers without grounding context.
    let retriever = Arc::new(CorpusRetriever::from_config(&config.retrieval));
    let docs_dir = expand_home(&config.retrieval.docs_dir);
    match retriever.load_directory(&docs_dir) {
        Ok(chunks) => {
            tracing::info!(path = %docs_dir.display(), chunks, "Document corpus indexed")
        }
        Err(e) => {
            tracing::warn!(path = %docs_dir.display(), error = %e, "No document corpus loaded")
        }
    }

    // Completion collaborator.
    let completion = Arc::new(OllamaClient::new(&config.llm)?);
    tracing::info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "Completion client ready"
    );

    // Speech collaborators.
    let synthesizer = Arc::new(HttpSynthesizer::new(&config.speech)?);
    let transcriber = Arc::new(HttpTranscriber::new(&config.speech)?);
    let audio_dir = expand_home(&config.server.audio_dir);
    let coordinator = Arc::new(AudioJobCoordinator::new(
        synthesizer,
        &config.speech,
        audio_dir.clone(),
        &config.server.public_base_url,
    )?);
    tracing::info!(path = %audio_dir.display(), mode = %config.speech.mode, "Audio coordinator ready");

    // Conversation pipeline.
    let sessions = Arc::new(SessionStore::from_config(&config.session));
    let orchestrator = Arc::new(MentorOrchestrator::new(
        completion,
        retriever,
        sessions,
        Duration::from_secs(config.llm.request_timeout_secs),
    ));

    // === API server ===

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, orchestrator, coordinator, transcriber, audit);
    let router = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind — is another instance running?");
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
