use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::{InterviewEngine, Phase};
use crate::models::resume::{Project, ResumeRow};
use crate::models::session::{Mode, SessionRow, SessionSetup};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub setup: SessionSetup,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub phase: Phase,
    pub greeting: String,
    pub question_count: u32,
    pub max_questions: u32,
}

/// POST /api/v1/sessions
///
/// Validates setup, creates the session row, constructs the engine, and
/// returns the deterministic greeting. In placement mode the user's current
/// resume is loaded as interviewer context.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    req.setup.validate()?;

    let store = state.store();
    let resume_context = match req.setup.mode {
        Mode::Placement => store
            .latest_resume(req.user_id)
            .await?
            .map(|r| format_resume_context(&r))
            .unwrap_or_default(),
        Mode::Viva => String::new(),
    };

    let row = store.create_session(req.user_id, &req.setup).await?;

    let mut engine = InterviewEngine::new(
        row.id,
        req.user_id,
        req.setup,
        resume_context,
        state.config.max_questions,
        Arc::new(state.llm.clone()),
        Arc::new(store),
        state.speech.clone(),
    );
    let greeting = engine.greet().await?;

    let response = CreateSessionResponse {
        session_id: row.id,
        phase: engine.phase(),
        greeting,
        question_count: engine.question_count(),
        max_questions: state.config.max_questions,
    };
    state.sessions.insert(row.id, engine).await;

    Ok(Json(response))
}

/// GET /api/v1/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SessionRow>>, AppError> {
    let rows = state.store().list_sessions(params.user_id).await?;
    Ok(Json(rows))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionRow>, AppError> {
    let row = state
        .store()
        .get_session(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    if row.user_id != params.user_id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(row))
}

/// Formats the user's current resume for the interviewer persona.
fn format_resume_context(resume: &ResumeRow) -> String {
    let projects: Vec<Project> =
        serde_json::from_value(resume.projects.clone()).unwrap_or_default();
    let projects = if projects.is_empty() {
        "No specific projects found.".to_string()
    } else {
        projects
            .iter()
            .map(|p| format!("{}: {}", p.name, p.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "CANDIDATE RESUME CONTEXT:\n- Skills: {}\n- Projects: {}",
        resume.skills.join(", "),
        projects
    )
}
