mod config;
mod db;
mod errors;
mod interview;
mod llm;
mod models;
mod resume;
mod routes;
mod scoring;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::registry::SessionRegistry;
use crate::interview::speech::{NullSpeech, SpeechIo};
use crate::llm::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

/// Idle window after which an abandoned session's engine is reclaimed.
const MAX_IDLE_SECS: i64 = 3600;
const SWEEP_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.groq_api_key.clone());
    info!("LLM client initialized (model: {})", llm::MODEL);

    // Speech output is a client-runtime concern; the server injects a no-op
    // adapter so finalization proceeds straight to evaluation.
    let speech: Arc<dyn SpeechIo> = Arc::new(NullSpeech::default());

    info!("Question budget per session: {}", config.max_questions);

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        sessions: SessionRegistry::default(),
        speech,
    };

    // Abandoned interviews never reach the scoring-time removal, so a
    // periodic sweep reclaims their engines.
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(MAX_IDLE_SECS).await;
            if evicted > 0 {
                info!("Evicted {evicted} idle interview sessions");
            }
        }
    });

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
