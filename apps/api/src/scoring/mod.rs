//! Scoring Pipeline — converts an accumulated transcript into a structured
//! evaluation via one evaluator-persona completion call.
//!
//! The pipeline never leaves an evaluation absent once invoked: malformed
//! model output degrades to a deterministic fallback record which is still
//! persisted, so the user always sees a result. Re-invocation on a
//! completed session is idempotent and issues zero completion calls.

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm::{prompts, strip_json_fences, CompletionService};
use crate::models::session::{Evaluation, SessionRow, Turn};

/// Session load/persist seam for the pipeline. The Postgres implementation
/// lives in `store`; tests use an in-memory double.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn load_session(&self, session_id: Uuid) -> Result<Option<SessionRow>, AppError>;

    /// Writes the evaluation, sets `status = 'completed'` and `completed_at`.
    async fn save_evaluation(
        &self,
        session_id: Uuid,
        evaluation: &Evaluation,
    ) -> Result<(), AppError>;
}

/// Flattens the turn sequence for the evaluator: `"<ROLE>: <content>"`,
/// newline-joined.
pub fn format_transcript(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "No conversation recorded.".to_string();
    }
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.transcript_label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The fixed record applied when the model's output cannot be parsed.
pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        technical_score: 50,
        communication_score: 50,
        project_defense_score: 50,
        overall_score: 50,
        strengths: "Participation recorded".to_string(),
        improvements: "Error parsing detailed feedback".to_string(),
        action_plan: vec!["Review transcript manually".to_string()],
    }
}

/// Parses the evaluator's reply. Fences are stripped first; anything that
/// then fails strict parsing yields the deterministic fallback. Scores are
/// taken as-is — no clamping to [0,100].
pub fn parse_evaluation(text: &str) -> Evaluation {
    match serde_json::from_str(strip_json_fences(text)) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            warn!("Evaluation JSON parse failed, applying fallback: {e}");
            fallback_evaluation()
        }
    }
}

/// Runs the scoring pipeline for one session.
///
/// Already-completed sessions short-circuit to the stored evaluation. A
/// transport failure on the completion call propagates (the caller retries);
/// only malformed output takes the fallback path.
pub async fn evaluate_session(
    store: &dyn EvaluationStore,
    completion: &dyn CompletionService,
    session_id: Uuid,
) -> Result<Evaluation, AppError> {
    let session = store
        .load_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    if let Some(stored) = session.stored_evaluation() {
        return Ok(stored);
    }

    let transcript = format_transcript(&session.turns());
    let target = session
        .role
        .as_deref()
        .or(session.subject.as_deref())
        .unwrap_or("General");
    let difficulty = session.difficulty.as_deref().unwrap_or("Standard");
    let system = prompts::evaluator_system(&session.mode, target, difficulty);

    let text = completion
        .complete(&system, &format!("TRANSCRIPT:\n\n{transcript}"))
        .await?;

    let evaluation = parse_evaluation(&text);

    store.save_evaluation(session_id, &evaluation).await?;
    info!(
        "Session {session_id} evaluated: overall {}",
        evaluation.overall_score
    );

    Ok(evaluation)
}
