pub mod health;
pub mod interview;
pub mod resumes;
pub mod sessions;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route(
            "/api/v1/sessions",
            post(sessions::handle_create_session).get(sessions::handle_list_sessions),
        )
        .route("/api/v1/sessions/:id", get(sessions::handle_get_session))
        // Interview flow
        .route(
            "/api/v1/sessions/:id/answer",
            post(interview::handle_answer),
        )
        .route(
            "/api/v1/sessions/:id/finalize",
            post(interview::handle_finalize),
        )
        .route("/api/v1/sessions/:id/mute", post(interview::handle_mute))
        .route(
            "/api/v1/sessions/:id/playback-complete",
            post(interview::handle_playback_complete),
        )
        .route(
            "/api/v1/sessions/:id/evaluate",
            post(interview::handle_evaluate),
        )
        // Resume API
        .route("/api/v1/resumes", post(resumes::handle_upload))
        .route("/api/v1/resumes/current", get(resumes::handle_current))
        .with_state(state)
}
