//! All LLM persona and prompt builders for the interview flow.
//!
//! Personas are fixed per call: the Completion Service has no session memory,
//! so every call carries its full context in the prompt.

use crate::models::session::{Mode, SessionSetup};

/// System persona for the resume analyzer — enforces JSON-only output.
pub const RESUME_ANALYSIS_SYSTEM: &str = r#"You are an expert resume analyzer. Return ONLY a JSON object with this structure:
{
  "skills": ["skill1", "skill2"],
  "projects": [{ "name": "Project Name", "description": "Desc", "technologies": ["tech"] }],
  "education": "Education Summary",
  "experience": ["Exp 1", "Exp 2"]
}
Do not add markdown formatting."#;

/// System persona used when the candidate has just answered the final
/// question: a short review, no further questions.
pub const FINAL_REVIEW_SYSTEM: &str = "You are an Interview Evaluator. The candidate has just answered the final question.\n\
TASK:\n\
- Provide a concise review of the candidate's last answer in 2-4 short sentences.\n\
- Offer a brief appreciation sentence (one line) and 1-2 quick suggestions for improvement.\n\
- Do NOT ask any further questions.\n\
- Keep tone professional and encouraging.";

/// Builds the interviewer persona for a question-asking round.
/// `resume_context` is empty outside placement mode.
pub fn interviewer_system(setup: &SessionSetup, resume_context: &str, final_round: bool) -> String {
    if final_round {
        return FINAL_REVIEW_SYSTEM.to_string();
    }

    match setup.mode {
        Mode::Placement => {
            let role = setup.role.as_deref().unwrap_or("the target");
            format!(
                "You are a strict Technical Interviewer for the role of '{role}'.\n\
                {resume_context}\n\
                INSTRUCTIONS:\n\
                1. Use the 'Candidate Resume Context' above.\n\
                2. Ask a specific question about a Project or Skill listed in their resume.\n\
                3. Example: \"I see you used [Skill] in [Project]. How did you handle [Specific Problem]?\"\n\
                4. Keep your response concise (2-3 sentences max).\n\
                5. Speak in a professional tone."
            )
        }
        Mode::Viva => {
            let subject = setup.subject.as_deref().unwrap_or("the subject");
            let year = setup.difficulty.as_deref().unwrap_or("3rd");
            format!(
                "You are a strict External Examiner conducting a Viva for '{subject}' (Year: {year}).\n\
                INSTRUCTIONS:\n\
                1. Ask theoretical definitions and curriculum-based questions for the subject '{subject}'.\n\
                2. If the student is wrong, correct them immediately.\n\
                3. Keep your response concise (2-3 sentences max)."
            )
        }
    }
}

/// Builds the evaluator persona for the scoring pipeline — strict-JSON-only
/// scorecard over the full transcript.
pub fn evaluator_system(mode: &str, target: &str, difficulty: &str) -> String {
    format!(
        "You are an Expert Interview Evaluator.\n\
        \n\
        CONTEXT:\n\
        - Interview Mode: {mode}\n\
        - Target: {target} ({difficulty})\n\
        \n\
        TASK:\n\
        Analyze the TRANSCRIPT below. Assign scores (0-100) based on the candidate's actual answers.\n\
        \n\
        OUTPUT FORMAT (Strict JSON only, no markdown):\n\
        {{\n\
          \"technical_score\": number,\n\
          \"communication_score\": number,\n\
          \"project_defense_score\": number,\n\
          \"overall_score\": number,\n\
          \"strengths\": \"string (2 bullet points)\",\n\
          \"improvements\": \"string (2 bullet points)\",\n\
          \"action_plan\": [\"string\", \"string\", \"string\"]\n\
        }}"
    )
}
