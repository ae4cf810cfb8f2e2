use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Interview mode. Placement targets a job role; viva targets an academic
/// subject at a given difficulty/year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Placement,
    Viva,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Placement => "placement",
            Mode::Viva => "viva",
        }
    }
}

/// Who spoke a turn. Serialized lowercase to match the stored transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Interviewer,
    Candidate,
}

impl TurnRole {
    /// Uppercase label used when flattening the transcript for evaluation.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            TurnRole::Interviewer => "INTERVIEWER",
            TurnRole::Candidate => "CANDIDATE",
        }
    }
}

/// One utterance in a session's transcript. Append-only: once recorded, a
/// turn is never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Turn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Session setup captured before the interview starts.
/// Validated before any session row is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSetup {
    pub mode: Mode,
    pub role: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub year: Option<String>,
}

impl SessionSetup {
    /// Precondition check: placement needs a role, viva needs a subject.
    /// A violation is a blocking error — no partial session is created.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.mode {
            Mode::Placement => {
                if self.role.as_deref().map_or(true, |r| r.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "Placement mode requires a target role".to_string(),
                    ));
                }
            }
            Mode::Viva => {
                if self.subject.as_deref().map_or(true, |s| s.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "Viva mode requires a subject".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Role or subject, whichever the mode targets.
    pub fn target(&self) -> &str {
        match self.mode {
            Mode::Placement => self.role.as_deref().unwrap_or(""),
            Mode::Viva => self.subject.as_deref().unwrap_or(""),
        }
    }
}

/// The structured scorecard produced by the scoring pipeline.
/// `overall_score` is model-assigned, not derived from the other three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub technical_score: u32,
    pub communication_score: u32,
    pub project_defense_score: u32,
    pub overall_score: u32,
    pub strengths: String,
    pub improvements: String,
    pub action_plan: Vec<String>,
}

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mode: String,
    pub role: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub year: Option<String>,
    pub messages: Value,
    pub status: String,
    pub question_count: i32,
    pub duration: i32,
    pub technical_score: Option<i32>,
    pub communication_score: Option<i32>,
    pub project_defense_score: Option<i32>,
    pub overall_score: Option<i32>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub action_plan: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    /// Deserializes the stored transcript. A malformed `messages` column is
    /// treated as an empty transcript rather than a hard failure.
    pub fn turns(&self) -> Vec<Turn> {
        serde_json::from_value(self.messages.clone()).unwrap_or_default()
    }

    /// Returns the stored evaluation if this session already completed.
    /// Used by the scoring pipeline's idempotence guard.
    pub fn stored_evaluation(&self) -> Option<Evaluation> {
        if self.status != STATUS_COMPLETED {
            return None;
        }
        Some(Evaluation {
            technical_score: self.technical_score? as u32,
            communication_score: self.communication_score? as u32,
            project_defense_score: self.project_defense_score? as u32,
            overall_score: self.overall_score? as u32,
            strengths: self.strengths.clone()?,
            improvements: self.improvements.clone()?,
            action_plan: self
                .action_plan
                .clone()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
        })
    }
}
