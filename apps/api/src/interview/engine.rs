//! Session State Machine — owns question counting, turn sequencing,
//! finalization gating, and evaluation triggering.
//!
//! Phases: `Greeting → AwaitingAnswer ⇄ Processing → Finalizing →
//! Evaluating → Done`. The phase is a single tagged value, not a pile of
//! boolean flags, so impossible combinations cannot be represented.
//!
//! The engine is single-writer: one session belongs to one user's client,
//! and the registry wraps each engine in a `Mutex`. The only suspension
//! points are the Completion Service and Transcript Store calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::speech::{CaptureHandle, PlaybackHandle, SpeechIo};
use crate::llm::{prompts, CompletionService};
use crate::models::session::{Mode, SessionSetup, Turn, TurnRole};

/// Demo question budget. Overridable via config; the N-th candidate answer
/// always triggers `final = true` on that same completion call.
pub const DEFAULT_MAX_QUESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Greeting,
    AwaitingAnswer,
    Processing,
    Finalizing,
    Evaluating,
    Done,
}

/// Durable transcript/metrics sink. Writes are sequential per session;
/// a failed write is logged and the in-memory session continues — a
/// documented data-loss risk, never a blocked interview.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save_turns(&self, session_id: Uuid, turns: &[Turn]) -> Result<(), AppError>;

    async fn save_metrics(
        &self,
        session_id: Uuid,
        question_count: u32,
        duration_secs: i64,
    ) -> Result<(), AppError>;
}

/// Result of one answer submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The interviewer asked the next question.
    NextQuestion { reply: String, question_count: u32 },
    /// That was the final question: the reply is a short review and the
    /// session now awaits the explicit finalize action.
    FinalReview { reply: String },
}

/// Result of the finalize step.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub conclusion: Option<String>,
    /// True when evaluation should run now; false when it waits for the
    /// spoken conclusion to finish (or be muted).
    pub evaluation_due: bool,
}

pub struct InterviewEngine {
    session_id: Uuid,
    user_id: Uuid,
    setup: SessionSetup,
    resume_context: String,
    turns: Vec<Turn>,
    phase: Phase,
    question_count: u32,
    max_questions: u32,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    capture: Option<CaptureHandle>,
    playback: Option<PlaybackHandle>,
    waiting_for_conclusion: bool,
    evaluation_fired: bool,
    completion: Arc<dyn CompletionService>,
    store: Arc<dyn TranscriptStore>,
    speech: Arc<dyn SpeechIo>,
}

impl InterviewEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: Uuid,
        user_id: Uuid,
        setup: SessionSetup,
        resume_context: String,
        max_questions: u32,
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn TranscriptStore>,
        speech: Arc<dyn SpeechIo>,
    ) -> Self {
        InterviewEngine {
            session_id,
            user_id,
            setup,
            resume_context,
            turns: Vec::new(),
            phase: Phase::Greeting,
            question_count: 0,
            max_questions,
            started_at: Utc::now(),
            last_activity: Utc::now(),
            capture: None,
            playback: None,
            waiting_for_conclusion: false,
            evaluation_fired: false,
            completion,
            store,
            speech,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn duration_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Seconds since the last client interaction. The registry sweep uses
    /// this to evict abandoned sessions.
    pub fn idle_secs(&self) -> i64 {
        (Utc::now() - self.last_activity).num_seconds()
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Opens the interview: a deterministic opening line from a template
    /// keyed by mode — no completion call. Sets `question_count = 1`.
    pub async fn greet(&mut self) -> Result<String, AppError> {
        if self.phase != Phase::Greeting {
            return Err(AppError::UnprocessableEntity(
                "Session already greeted".to_string(),
            ));
        }

        self.touch();
        let greeting = match self.setup.mode {
            Mode::Placement => format!(
                "Hello! I am your interviewer for the {} role. Let's start. Tell me about yourself.",
                self.setup.target()
            ),
            Mode::Viva => format!(
                "Hello! Starting your Viva for {}. Define the core concept of this subject.",
                self.setup.target()
            ),
        };

        self.append_turn(TurnRole::Interviewer, &greeting);
        self.persist_turns().await;
        self.question_count = 1;
        self.speak(&greeting);
        self.resume_capture();
        self.phase = Phase::AwaitingAnswer;

        Ok(greeting)
    }

    /// Handles one candidate answer.
    ///
    /// Only legal in `AwaitingAnswer` — submissions raised while a reply is
    /// pending (or after the final question) are rejected, so overlapping
    /// answers can never corrupt turn order. The candidate turn is appended
    /// optimistically before the completion call; on completion failure the
    /// phase returns to `AwaitingAnswer` with no interviewer turn appended,
    /// and the candidate may retry.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, AppError> {
        if self.phase != Phase::AwaitingAnswer {
            return Err(AppError::UnprocessableEntity(format!(
                "Session is not accepting answers (phase: {:?})",
                self.phase
            )));
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AppError::Validation("Answer must not be empty".to_string()));
        }

        self.touch();
        self.phase = Phase::Processing;
        self.pause_capture();

        self.append_turn(TurnRole::Candidate, answer);
        self.persist_turns().await;

        let final_round = self.question_count >= self.max_questions;
        let system = prompts::interviewer_system(&self.setup, &self.resume_context, final_round);
        let history = serde_json::to_string(&self.turns).unwrap_or_default();
        let prompt = format!("History: {history}\nUser said: {answer}");

        let reply = match self.completion.complete(&system, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.phase = Phase::AwaitingAnswer;
                self.resume_capture();
                return Err(AppError::Llm(
                    "Completion service returned an empty reply".to_string(),
                ));
            }
            Err(e) => {
                self.phase = Phase::AwaitingAnswer;
                self.resume_capture();
                return Err(e);
            }
        };

        self.append_turn(TurnRole::Interviewer, &reply);
        self.persist_turns().await;
        self.speak(&reply);

        if final_round {
            // Two-step gate: the closing review is read/heard first, then
            // the user explicitly asks for the score.
            self.phase = Phase::Finalizing;
            info!(
                "Session {} reached the question budget ({})",
                self.session_id, self.max_questions
            );
            Ok(AnswerOutcome::FinalReview { reply })
        } else {
            self.question_count += 1;
            self.phase = Phase::AwaitingAnswer;
            self.resume_capture();
            Ok(AnswerOutcome::NextQuestion {
                reply,
                question_count: self.question_count,
            })
        }
    }

    /// The explicit finalize action: one more completion call for the
    /// concluding remark, metrics persisted, then evaluation — immediately
    /// when audio is off, otherwise after spoken playback ends.
    ///
    /// A completion failure here is tolerated: the evaluation step is never
    /// lost to a missing conclusion.
    pub async fn finalize(&mut self) -> Result<FinalizeOutcome, AppError> {
        if self.phase != Phase::Finalizing {
            return Err(AppError::UnprocessableEntity(format!(
                "Session is not ready to finalize (phase: {:?})",
                self.phase
            )));
        }

        self.touch();
        self.persist_metrics().await;

        let transcript = serde_json::to_string(&self.turns).unwrap_or_default();
        let prompt = format!(
            "TRANSCRIPT: {transcript}\nPlease provide a concluding summary as the interviewer/faculty."
        );

        let conclusion = match self
            .completion
            .complete(prompts::FINAL_REVIEW_SYSTEM, &prompt)
            .await
        {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not generate concluding remark: {e}");
                None
            }
        };

        if let Some(text) = &conclusion {
            self.append_turn(TurnRole::Interviewer, text);
            self.persist_turns().await;

            if let Some(handle) = self.speech.speak(text) {
                self.playback = Some(handle);
                self.waiting_for_conclusion = true;
                return Ok(FinalizeOutcome {
                    conclusion,
                    evaluation_due: false,
                });
            }
        }

        let evaluation_due = self.begin_evaluation();
        Ok(FinalizeOutcome {
            conclusion,
            evaluation_due,
        })
    }

    /// Playback-end callback for the spoken conclusion. Returns true when
    /// the caller should run the scoring pipeline now. Single-fire: a
    /// cancelled playback that still reports its end fires nothing.
    pub fn playback_finished(&mut self) -> bool {
        self.touch();
        if !self.waiting_for_conclusion {
            return false;
        }
        self.waiting_for_conclusion = false;
        self.playback = None;
        self.begin_evaluation()
    }

    /// Mutes audio output. Cancels any in-flight utterance; when the
    /// conclusion was being spoken, evaluation becomes due immediately.
    /// Returns true when the caller should run the scoring pipeline now.
    pub fn mute(&mut self) -> bool {
        self.touch();
        if let Some(handle) = self.playback.take() {
            self.speech.cancel_speech(handle);
        }
        if !self.waiting_for_conclusion {
            return false;
        }
        self.waiting_for_conclusion = false;
        self.begin_evaluation()
    }

    /// Marks scoring as persisted. A completed session never reverts.
    pub fn mark_done(&mut self) {
        self.phase = Phase::Done;
    }

    fn begin_evaluation(&mut self) -> bool {
        if self.evaluation_fired {
            return false;
        }
        self.evaluation_fired = true;
        self.phase = Phase::Evaluating;
        true
    }

    fn append_turn(&mut self, role: TurnRole, content: &str) {
        self.turns.push(Turn::new(role, content));
    }

    /// Persists the full turn sequence. Optimistic local append is
    /// authoritative; a failed write leaves local and stored state diverged
    /// until the next successful write.
    async fn persist_turns(&self) {
        if let Err(e) = self.store.save_turns(self.session_id, &self.turns).await {
            warn!(
                "Failed to persist turns for session {}: {e}",
                self.session_id
            );
        }
    }

    async fn persist_metrics(&self) {
        if let Err(e) = self
            .store
            .save_metrics(self.session_id, self.question_count, self.duration_secs())
            .await
        {
            warn!(
                "Failed to persist metrics for session {}: {e}",
                self.session_id
            );
        }
    }

    fn speak(&mut self, text: &str) {
        self.playback = self.speech.speak(text);
    }

    fn resume_capture(&mut self) {
        if self.capture.is_none() {
            self.capture = Some(self.speech.start_capture());
        }
    }

    fn pause_capture(&mut self) {
        if let Some(handle) = self.capture.take() {
            self.speech.stop_capture(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String, String>>>,
        systems: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
            Arc::new(ScriptedCompletion {
                replies: Mutex::new(replies.into_iter().collect()),
                systems: Mutex::new(Vec::new()),
            })
        }

        fn endless(reply: &str) -> Arc<Self> {
            Self::new(vec![Ok(reply.to_string()); 16])
        }

        fn final_persona_calls(&self) -> usize {
            self.systems
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.as_str() == prompts::FINAL_REVIEW_SYSTEM)
                .count()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, system: &str, _prompt: &str) -> Result<String, AppError> {
            self.systems.lock().unwrap().push(system.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(AppError::Llm(msg)),
                None => Ok("Next question?".to_string()),
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved_turns: Mutex<Vec<Vec<Turn>>>,
        saved_metrics: Mutex<Vec<(u32, i64)>>,
    }

    #[async_trait]
    impl TranscriptStore for MemoryStore {
        async fn save_turns(&self, _session_id: Uuid, turns: &[Turn]) -> Result<(), AppError> {
            self.saved_turns.lock().unwrap().push(turns.to_vec());
            Ok(())
        }

        async fn save_metrics(
            &self,
            _session_id: Uuid,
            question_count: u32,
            duration_secs: i64,
        ) -> Result<(), AppError> {
            self.saved_metrics
                .lock()
                .unwrap()
                .push((question_count, duration_secs));
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl TranscriptStore for FailingStore {
        async fn save_turns(&self, _session_id: Uuid, _turns: &[Turn]) -> Result<(), AppError> {
            Err(AppError::Llm("store unavailable".to_string()))
        }

        async fn save_metrics(
            &self,
            _session_id: Uuid,
            _question_count: u32,
            _duration_secs: i64,
        ) -> Result<(), AppError> {
            Err(AppError::Llm("store unavailable".to_string()))
        }
    }

    /// Speech double with audio output enabled: every `speak` yields a
    /// playback handle, and cancels/stops are recorded.
    #[derive(Default)]
    struct FakeSpeech {
        next: AtomicU64,
        cancelled: Mutex<Vec<PlaybackHandle>>,
        captures_started: AtomicU64,
        captures_stopped: AtomicU64,
    }

    impl SpeechIo for FakeSpeech {
        fn start_capture(&self) -> CaptureHandle {
            self.captures_started.fetch_add(1, Ordering::Relaxed);
            CaptureHandle(self.next.fetch_add(1, Ordering::Relaxed))
        }

        fn stop_capture(&self, _handle: CaptureHandle) {
            self.captures_stopped.fetch_add(1, Ordering::Relaxed);
        }

        fn speak(&self, _text: &str) -> Option<PlaybackHandle> {
            Some(PlaybackHandle(self.next.fetch_add(1, Ordering::Relaxed)))
        }

        fn cancel_speech(&self, handle: PlaybackHandle) {
            self.cancelled.lock().unwrap().push(handle);
        }
    }

    fn placement_setup() -> SessionSetup {
        SessionSetup {
            mode: Mode::Placement,
            role: Some("Backend Developer".to_string()),
            subject: None,
            difficulty: None,
            year: None,
        }
    }

    fn engine_with(
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn TranscriptStore>,
        speech: Arc<dyn SpeechIo>,
    ) -> InterviewEngine {
        InterviewEngine::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            placement_setup(),
            String::new(),
            DEFAULT_MAX_QUESTIONS,
            completion,
            store,
            speech,
        )
    }

    fn engine(completion: Arc<dyn CompletionService>) -> InterviewEngine {
        engine_with(
            completion,
            Arc::new(MemoryStore::default()),
            Arc::new(crate::interview::speech::NullSpeech::default()),
        )
    }

    async fn drive_to_finalizing(engine: &mut InterviewEngine) {
        engine.greet().await.unwrap();
        for i in 0..DEFAULT_MAX_QUESTIONS {
            engine
                .submit_answer(&format!("answer number {i}"))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_greeting_is_deterministic_and_counts_first_question() {
        let completion = ScriptedCompletion::endless("Next question?");
        let mut engine = engine(completion.clone());

        let greeting = engine.greet().await.unwrap();
        assert_eq!(
            greeting,
            "Hello! I am your interviewer for the Backend Developer role. Let's start. Tell me about yourself."
        );
        assert_eq!(engine.question_count(), 1);
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
        // The greeting comes from a template, never from the model.
        assert!(completion.systems.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_viva_greeting_is_subject_directed() {
        let setup = SessionSetup {
            mode: Mode::Viva,
            role: None,
            subject: Some("Operating Systems".to_string()),
            difficulty: Some("3rd".to_string()),
            year: None,
        };
        let mut engine = InterviewEngine::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            setup,
            String::new(),
            DEFAULT_MAX_QUESTIONS,
            ScriptedCompletion::endless("ok"),
            Arc::new(MemoryStore::default()),
            Arc::new(crate::interview::speech::NullSpeech::default()),
        );
        let greeting = engine.greet().await.unwrap();
        assert!(greeting.contains("Operating Systems"));
    }

    #[tokio::test]
    async fn test_fifth_answer_triggers_exactly_one_final_call() {
        let completion = ScriptedCompletion::endless("Interesting. Tell me more.");
        let mut engine = engine(completion.clone());

        engine.greet().await.unwrap();
        for i in 0..DEFAULT_MAX_QUESTIONS - 1 {
            let outcome = engine.submit_answer(&format!("answer {i}")).await.unwrap();
            assert!(matches!(outcome, AnswerOutcome::NextQuestion { .. }));
            assert_eq!(completion.final_persona_calls(), 0);
        }

        assert_eq!(engine.question_count(), DEFAULT_MAX_QUESTIONS);
        let outcome = engine.submit_answer("my last answer").await.unwrap();
        assert!(matches!(outcome, AnswerOutcome::FinalReview { .. }));
        assert_eq!(completion.final_persona_calls(), 1);
        assert_eq!(engine.phase(), Phase::Finalizing);
        // The budget is reached on the same call, not after an extra round-trip.
        assert_eq!(engine.question_count(), DEFAULT_MAX_QUESTIONS);
    }

    #[tokio::test]
    async fn test_question_count_never_decreases() {
        let mut engine = engine(ScriptedCompletion::endless("Next?"));
        engine.greet().await.unwrap();

        let mut last = engine.question_count();
        for i in 0..DEFAULT_MAX_QUESTIONS {
            engine.submit_answer(&format!("a{i}")).await.unwrap();
            assert!(engine.question_count() >= last);
            assert!(engine.question_count() <= DEFAULT_MAX_QUESTIONS);
            last = engine.question_count();
        }
    }

    #[tokio::test]
    async fn test_submission_rejected_while_finalizing() {
        let mut engine = engine(ScriptedCompletion::endless("reply"));
        drive_to_finalizing(&mut engine).await;

        let err = engine.submit_answer("one more").await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert_eq!(engine.phase(), Phase::Finalizing);
    }

    #[tokio::test]
    async fn test_empty_answer_rejected() {
        let mut engine = engine(ScriptedCompletion::endless("reply"));
        engine.greet().await.unwrap();

        let err = engine.submit_answer("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
    }

    #[tokio::test]
    async fn test_completion_failure_leaves_session_retryable() {
        let completion = ScriptedCompletion::new(vec![
            Err("service unavailable".to_string()),
            Ok("Recovered. Next question?".to_string()),
        ]);
        let mut engine = engine(completion);
        engine.greet().await.unwrap();

        let err = engine.submit_answer("my answer").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
        // No interviewer turn for the missing reply; the optimistic
        // candidate turn stays.
        assert_eq!(engine.turns().last().unwrap().role, TurnRole::Candidate);

        let outcome = engine.submit_answer("my answer again").await.unwrap();
        assert!(matches!(outcome, AnswerOutcome::NextQuestion { .. }));
    }

    #[tokio::test]
    async fn test_empty_reply_treated_as_failure() {
        let completion = ScriptedCompletion::new(vec![Ok("   ".to_string())]);
        let mut engine = engine(completion);
        engine.greet().await.unwrap();

        let err = engine.submit_answer("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
    }

    #[tokio::test]
    async fn test_turns_alternate_with_trailing_conclusion() {
        let mut engine = engine(ScriptedCompletion::endless("reply"));
        drive_to_finalizing(&mut engine).await;
        engine.finalize().await.unwrap();

        let turns = engine.turns();
        // Greeting first, then no two consecutive candidate turns.
        assert_eq!(turns[0].role, TurnRole::Interviewer);
        for pair in turns.windows(2) {
            assert!(
                !(pair[0].role == TurnRole::Candidate && pair[1].role == TurnRole::Candidate),
                "two consecutive candidate turns"
            );
        }
        // The concluding remark follows the final interviewer review.
        assert_eq!(turns.last().unwrap().role, TurnRole::Interviewer);
    }

    #[tokio::test]
    async fn test_finalize_without_audio_evaluates_immediately() {
        let store = Arc::new(MemoryStore::default());
        let mut engine = engine_with(
            ScriptedCompletion::endless("Well done overall."),
            store.clone(),
            Arc::new(crate::interview::speech::NullSpeech::default()),
        );
        drive_to_finalizing(&mut engine).await;

        let outcome = engine.finalize().await.unwrap();
        assert!(outcome.evaluation_due);
        assert_eq!(outcome.conclusion.as_deref(), Some("Well done overall."));
        assert_eq!(engine.phase(), Phase::Evaluating);

        // Metrics were persisted with the final question count.
        let metrics = store.saved_metrics.lock().unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].0, DEFAULT_MAX_QUESTIONS);
    }

    #[tokio::test]
    async fn test_finalize_with_audio_waits_then_fires_once() {
        let speech = Arc::new(FakeSpeech::default());
        let mut engine = engine_with(
            ScriptedCompletion::endless("Thanks for your time."),
            Arc::new(MemoryStore::default()),
            speech.clone(),
        );
        drive_to_finalizing(&mut engine).await;

        let outcome = engine.finalize().await.unwrap();
        assert!(!outcome.evaluation_due);
        assert_eq!(engine.phase(), Phase::Finalizing);

        assert!(engine.playback_finished());
        assert_eq!(engine.phase(), Phase::Evaluating);
        // Neither a second playback end nor a late mute fires again.
        assert!(!engine.playback_finished());
        assert!(!engine.mute());
    }

    #[tokio::test]
    async fn test_mute_during_conclusion_fires_exactly_once() {
        let speech = Arc::new(FakeSpeech::default());
        let mut engine = engine_with(
            ScriptedCompletion::endless("Thanks for your time."),
            Arc::new(MemoryStore::default()),
            speech.clone(),
        );
        drive_to_finalizing(&mut engine).await;
        engine.finalize().await.unwrap();

        assert!(engine.mute());
        assert_eq!(engine.phase(), Phase::Evaluating);
        assert_eq!(speech.cancelled.lock().unwrap().len(), 1);
        // The cancelled playback's own end callback must not fire again.
        assert!(!engine.playback_finished());
    }

    #[tokio::test]
    async fn test_conclusion_failure_still_reaches_evaluation() {
        let completion = ScriptedCompletion::new(vec![
            Ok("q2".to_string()),
            Ok("q3".to_string()),
            Ok("q4".to_string()),
            Ok("q5".to_string()),
            Ok("final review".to_string()),
            Err("conclusion call failed".to_string()),
        ]);
        let mut engine = engine(completion);
        drive_to_finalizing(&mut engine).await;

        let outcome = engine.finalize().await.unwrap();
        assert!(outcome.conclusion.is_none());
        assert!(outcome.evaluation_due);
        assert_eq!(engine.phase(), Phase::Evaluating);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_session() {
        let mut engine = engine_with(
            ScriptedCompletion::endless("Next question?"),
            Arc::new(FailingStore),
            Arc::new(crate::interview::speech::NullSpeech::default()),
        );
        engine.greet().await.unwrap();

        let outcome = engine.submit_answer("an answer").await.unwrap();
        assert!(matches!(outcome, AnswerOutcome::NextQuestion { .. }));
        assert_eq!(engine.turns().len(), 3);
    }

    #[tokio::test]
    async fn test_capture_paused_while_processing_and_finalizing() {
        let speech = Arc::new(FakeSpeech::default());
        let mut engine = engine_with(
            ScriptedCompletion::endless("reply"),
            Arc::new(MemoryStore::default()),
            speech.clone(),
        );
        drive_to_finalizing(&mut engine).await;

        // One start for the greeting plus one restart per non-final answer;
        // every submission stops capture and the final one never restarts.
        let started = speech.captures_started.load(Ordering::Relaxed);
        let stopped = speech.captures_stopped.load(Ordering::Relaxed);
        assert_eq!(started, DEFAULT_MAX_QUESTIONS as u64);
        assert_eq!(stopped, started);
    }
}
