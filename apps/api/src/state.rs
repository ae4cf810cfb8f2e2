use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::interview::registry::SessionRegistry;
use crate::interview::speech::SpeechIo;
use crate::llm::LlmClient;
use crate::store::PgSessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Live interview engines, one per in-progress session.
    pub sessions: SessionRegistry,
    /// Speech adapter injected into engines. `NullSpeech` on the server;
    /// real audio belongs to the client runtime.
    pub speech: Arc<dyn SpeechIo>,
}

impl AppState {
    pub fn store(&self) -> PgSessionStore {
        PgSessionStore::new(self.db.clone())
    }
}
