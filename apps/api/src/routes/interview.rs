//! Interview-flow handlers: answer submission, the finalize gate, the mute
//! cancellation path, and the (idempotent) evaluation endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::{AnswerOutcome, InterviewEngine, Phase};
use crate::models::session::Evaluation;
use crate::scoring;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SessionActionRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub phase: Phase,
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
}

#[derive(Serialize)]
pub struct FinalizeResponse {
    pub phase: Phase,
    pub conclusion: Option<String>,
    /// Present when evaluation ran immediately; absent while the spoken
    /// conclusion is still playing.
    pub evaluation: Option<Evaluation>,
}

#[derive(Serialize)]
pub struct PlaybackResponse {
    pub phase: Phase,
    pub evaluation: Option<Evaluation>,
}

async fn locked_engine(
    state: &AppState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<Arc<Mutex<InterviewEngine>>, AppError> {
    let engine = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No active session {session_id}")))?;
    if engine.lock().await.user_id() != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(engine)
}

/// POST /api/v1/sessions/:id/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let engine = locked_engine(&state, id, req.user_id).await?;
    let mut engine = engine.lock().await;

    let outcome = engine.submit_answer(&req.content).await?;
    Ok(Json(AnswerResponse {
        phase: engine.phase(),
        outcome,
    }))
}

/// POST /api/v1/sessions/:id/finalize
///
/// The explicit post-last-question gate. When audio output is disabled the
/// scoring pipeline runs before this returns; otherwise evaluation follows
/// the playback-complete (or mute) callback.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionActionRequest>,
) -> Result<Json<FinalizeResponse>, AppError> {
    let engine = locked_engine(&state, id, req.user_id).await?;
    let mut engine = engine.lock().await;

    let outcome = engine.finalize().await?;
    let evaluation = if outcome.evaluation_due {
        Some(run_scoring(&state, &mut engine).await?)
    } else {
        None
    };

    Ok(Json(FinalizeResponse {
        phase: engine.phase(),
        conclusion: outcome.conclusion,
        evaluation,
    }))
}

/// POST /api/v1/sessions/:id/mute
pub async fn handle_mute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionActionRequest>,
) -> Result<Json<PlaybackResponse>, AppError> {
    let engine = locked_engine(&state, id, req.user_id).await?;
    let mut engine = engine.lock().await;

    let evaluation = if engine.mute() {
        Some(run_scoring(&state, &mut engine).await?)
    } else {
        None
    };

    Ok(Json(PlaybackResponse {
        phase: engine.phase(),
        evaluation,
    }))
}

/// POST /api/v1/sessions/:id/playback-complete
///
/// Client callback for the end of the spoken conclusion. The engine's
/// single-fire guard makes a race against mute harmless.
pub async fn handle_playback_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionActionRequest>,
) -> Result<Json<PlaybackResponse>, AppError> {
    let engine = locked_engine(&state, id, req.user_id).await?;
    let mut engine = engine.lock().await;

    let evaluation = if engine.playback_finished() {
        Some(run_scoring(&state, &mut engine).await?)
    } else {
        None
    };

    Ok(Json(PlaybackResponse {
        phase: engine.phase(),
        evaluation,
    }))
}

/// POST /api/v1/sessions/:id/evaluate
///
/// Idempotent: a session that already completed returns its stored
/// evaluation without another completion call.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionActionRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let store = state.store();
    let session = store
        .get_session(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    if session.user_id != req.user_id {
        return Err(AppError::Forbidden);
    }

    let evaluation = scoring::evaluate_session(&store, &state.llm, id).await?;
    Ok(Json(evaluation))
}

async fn run_scoring(
    state: &AppState,
    engine: &mut InterviewEngine,
) -> Result<Evaluation, AppError> {
    let session_id = engine.session_id();
    let store = state.store();
    let evaluation = scoring::evaluate_session(&store, &state.llm, session_id).await?;
    engine.mark_done();
    state.sessions.remove(session_id).await;
    Ok(evaluation)
}
