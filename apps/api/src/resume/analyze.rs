//! Resume analysis — structured extraction via one Completion Service call,
//! followed by ATS scoring against the target role when one is supplied.

use tracing::warn;

use crate::errors::AppError;
use crate::llm::{strip_json_fences, CompletionService};
use crate::models::resume::ResumeAnalysis;
use crate::resume::roles::required_skills_for;
use crate::resume::score_against_role;

/// Truncation cap for the text handed to the analyzer model.
const MAX_ANALYSIS_CHARS: usize = 30_000;

/// Extracts plain text from an uploaded resume. PDF goes through
/// `pdf-extract`; plain text is decoded as UTF-8. Word documents are
/// rejected: there is no extractor for them in this stack, and decoding
/// the container bytes as text would store mojibake and feed it to the
/// analyzer model.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let name = file_name.to_lowercase();
    if name.ends_with(".pdf") {
        return pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AppError::UnprocessableEntity(format!("Failed to read document text: {e}"))
        });
    }

    // ZIP (docx) and OLE (legacy doc) container signatures; catches Word
    // uploads even when the extension lies.
    let is_word = name.ends_with(".docx")
        || name.ends_with(".doc")
        || bytes.starts_with(b"PK\x03\x04")
        || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]);
    if is_word {
        return Err(AppError::UnprocessableEntity(
            "Failed to read document text: unsupported format, upload PDF or plain text"
                .to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Runs the structured extraction call and, when the role is known, merges
/// the ATS score and skill gaps into the analysis.
///
/// A transport failure propagates (the caller retries); a malformed model
/// response degrades to the empty field-set rather than failing the upload.
pub async fn analyze_resume(
    completion: &dyn CompletionService,
    raw_text: &str,
    role: Option<&str>,
) -> Result<ResumeAnalysis, AppError> {
    let prompt = format!(
        "Analyze this resume content:\n\n{}",
        truncate_chars(raw_text, MAX_ANALYSIS_CHARS)
    );

    let text = completion
        .complete(crate::llm::prompts::RESUME_ANALYSIS_SYSTEM, &prompt)
        .await?;

    let mut analysis: ResumeAnalysis = match serde_json::from_str(strip_json_fences(&text)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Resume analysis JSON parse failed, using empty field-set: {e}");
            ResumeAnalysis::default()
        }
    };

    if let Some(required) = role.and_then(required_skills_for) {
        let report = score_against_role(required, &analysis.skills, raw_text);
        analysis.ats_score = Some(report.ats_score);
        analysis.skill_gaps = Some(report.gaps);
    }

    Ok(analysis)
}

/// Char-boundary-safe truncation.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedCompletion {
        reply: String,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl CompletionService for CannedCompletion {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AppError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.reply.clone())
        }
    }

    fn canned(reply: &str) -> CannedCompletion {
        CannedCompletion {
            reply: reply.to_string(),
            calls: Mutex::new(0),
        }
    }

    #[tokio::test]
    async fn test_fenced_extraction_parses_and_scores_role() {
        let completion = canned(
            "```json\n{\"skills\": [\"python\"], \"projects\": [], \"education\": \"BTech\", \"experience\": []}\n```",
        );
        let analysis = analyze_resume(
            &completion,
            "worked with SQL daily, also Django and Flask and Node.js and REST APIs",
            Some("Backend Developer"),
        )
        .await
        .unwrap();

        assert_eq!(analysis.skills, vec!["python"]);
        assert_eq!(analysis.education, "BTech");
        // All 7 Backend Developer skills found via list or raw text.
        assert_eq!(analysis.ats_score, Some(100));
        assert_eq!(analysis.skill_gaps.as_deref(), Some(&[][..]));
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades_to_empty_fields() {
        let completion = canned("I cannot comply.");
        let analysis = analyze_resume(&completion, "some resume text", None)
            .await
            .unwrap();

        assert_eq!(analysis, ResumeAnalysis::default());
    }

    #[tokio::test]
    async fn test_unknown_role_skips_ats_scoring() {
        let completion = canned("{\"skills\": [\"python\"]}");
        let analysis = analyze_resume(&completion, "text", Some("Astronaut"))
            .await
            .unwrap();

        assert!(analysis.ats_score.is_none());
        assert!(analysis.skill_gaps.is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 4), "héll");
        assert_eq!(truncate_chars(text, 100), text);
    }

    #[test]
    fn test_extract_text_passes_plain_text_through() {
        let text = extract_text("resume.txt", b"plain resume body").unwrap();
        assert_eq!(text, "plain resume body");
    }

    #[test]
    fn test_extract_text_rejects_word_documents() {
        // docx is a ZIP container; its bytes must never reach the analyzer
        // as lossy-decoded text.
        let err = extract_text("resume.docx", b"PK\x03\x04rest-of-zip").unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));

        let err = extract_text("resume.doc", &[0xD0, 0xCF, 0x11, 0xE0, 0xA1]).unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_extract_text_rejects_zip_bytes_behind_text_extension() {
        let err = extract_text("resume.txt", b"PK\x03\x04not-really-text").unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
