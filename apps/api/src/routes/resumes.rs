use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeAnalysis, ResumeRow};
use crate::resume::analyze::{analyze_resume, extract_text};
use crate::routes::sessions::UserIdQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub resume_id: Uuid,
    pub data: ResumeAnalysis,
}

/// POST /api/v1/resumes
///
/// Multipart upload: `file` (PDF or plain text), `user_id`, optional
/// `role`. Extracts text, runs the analyzer call, scores against the role
/// when one is supplied, persists the profile.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut role: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                user_id = Some(
                    text.parse()
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            Some("role") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid role field: {e}")))?;
                if !text.trim().is_empty() {
                    role = Some(text);
                }
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file field: {e}")))?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("user_id field is required".to_string()))?;
    let (file_name, data) =
        file.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;

    let raw_text = extract_text(&file_name, &data)?;
    let analysis = analyze_resume(&state.llm, &raw_text, role.as_deref()).await?;

    let row = state
        .store()
        .insert_resume(user_id, &file_name, &raw_text, &analysis)
        .await?;

    Ok(Json(UploadResponse {
        resume_id: row.id,
        data: analysis,
    }))
}

/// GET /api/v1/resumes/current
///
/// The user's current profile: most recent wins when multiple exist.
pub async fn handle_current(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    let row = state
        .store()
        .latest_resume(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No resume uploaded".to_string()))?;
    Ok(Json(row))
}
