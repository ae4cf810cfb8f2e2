//! Postgres-backed persistence for sessions and resumes.
//!
//! All writes are sequential per session (one client, one engine mutex),
//! so plain UPDATEs are sufficient — no multi-writer contention is assumed.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::TranscriptStore;
use crate::models::resume::{ResumeAnalysis, ResumeRow};
use crate::models::session::{
    Evaluation, SessionRow, SessionSetup, Turn, STATUS_COMPLETED, STATUS_IN_PROGRESS,
};
use crate::scoring::EvaluationStore;

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        PgSessionStore { pool }
    }

    /// Inserts a fresh in-progress session row.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        setup: &SessionSetup,
    ) -> Result<SessionRow, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO interview_sessions
                (id, user_id, mode, role, subject, difficulty, year, messages, status, question_count, duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '[]'::jsonb, $8, 0, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(setup.mode.as_str())
        .bind(&setup.role)
        .bind(&setup.subject)
        .bind(&setup.difficulty)
        .bind(&setup.year)
        .bind(STATUS_IN_PROGRESS)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<SessionRow>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM interview_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<SessionRow>, AppError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM interview_sessions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most recent resume for a user, if any.
    pub async fn latest_resume(&self, user_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert_resume(
        &self,
        user_id: Uuid,
        file_name: &str,
        raw_text: &str,
        analysis: &ResumeAnalysis,
    ) -> Result<ResumeRow, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes
                (id, user_id, file_name, raw_text, skills, projects, education, experience,
                 ats_score, skill_gaps, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(file_name)
        .bind(raw_text)
        .bind(&analysis.skills)
        .bind(serde_json::to_value(&analysis.projects).unwrap_or_else(|_| json!([])))
        .bind(&analysis.education)
        .bind(&analysis.experience)
        .bind(analysis.ats_score.map(|s| s as i32))
        .bind(&analysis.skill_gaps)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl TranscriptStore for PgSessionStore {
    async fn save_turns(&self, session_id: Uuid, turns: &[Turn]) -> Result<(), AppError> {
        let messages = serde_json::to_value(turns).unwrap_or_else(|_| json!([]));
        sqlx::query("UPDATE interview_sessions SET messages = $2 WHERE id = $1")
            .bind(session_id)
            .bind(messages)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_metrics(
        &self,
        session_id: Uuid,
        question_count: u32,
        duration_secs: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE interview_sessions SET question_count = $2, duration = $3 WHERE id = $1",
        )
        .bind(session_id)
        .bind(question_count as i32)
        .bind(duration_secs as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EvaluationStore for PgSessionStore {
    async fn load_session(&self, session_id: Uuid) -> Result<Option<SessionRow>, AppError> {
        self.get_session(session_id).await
    }

    async fn save_evaluation(
        &self,
        session_id: Uuid,
        evaluation: &Evaluation,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE interview_sessions SET
                technical_score = $2,
                communication_score = $3,
                project_defense_score = $4,
                overall_score = $5,
                strengths = $6,
                improvements = $7,
                action_plan = $8,
                status = $9,
                completed_at = $10
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(evaluation.technical_score as i32)
        .bind(evaluation.communication_score as i32)
        .bind(evaluation.project_defense_score as i32)
        .bind(evaluation.overall_score as i32)
        .bind(&evaluation.strengths)
        .bind(&evaluation.improvements)
        .bind(serde_json::to_value(&evaluation.action_plan).unwrap_or_else(|_| json!([])))
        .bind(STATUS_COMPLETED)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
