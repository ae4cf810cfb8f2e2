//! Resume Gap Analyzer — ATS-style match between an extracted resume and a
//! role's required-skill list.
//!
//! This is a coarse lexical heuristic by design: case-insensitive exact
//! token match against the parsed skills list, or substring match against
//! the raw resume text. No stemming, no synonym handling ("JS" does not
//! match "JavaScript"). A known limitation, not a bug.

use serde::{Deserialize, Serialize};

pub mod analyze;
pub mod roles;

/// Result of matching a resume against one role's required skills.
///
/// Invariant: `matched` and `gaps` partition the required list exactly —
/// no overlap, no omission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub matched: Vec<String>,
    pub gaps: Vec<String>,
    pub ats_score: u32,
}

/// Scores a resume against a role's required skills.
///
/// A required skill counts as matched when its case-folded form appears
/// either as an exact entry in the parsed skills list or as a substring of
/// the full raw resume text. `ats_score = round(100 × matched / required)`,
/// 0 when `required` is empty.
pub fn score_against_role(
    required: &[&str],
    parsed_skills: &[String],
    raw_text: &str,
) -> GapReport {
    if required.is_empty() {
        return GapReport {
            matched: vec![],
            gaps: vec![],
            ats_score: 0,
        };
    }

    let normalized_skills: Vec<String> = parsed_skills
        .iter()
        .map(|s| s.to_lowercase().trim().to_string())
        .collect();
    let text_lower = raw_text.to_lowercase();

    let mut matched = Vec::new();
    let mut gaps = Vec::new();

    for req in required {
        let key = req.to_lowercase();
        let in_skills = normalized_skills.iter().any(|s| *s == key);
        let in_text = text_lower.contains(&key);

        if in_skills || in_text {
            matched.push(req.to_string());
        } else {
            gaps.push(req.to_string());
        }
    }

    let ats_score = ((matched.len() as f64 / required.len() as f64) * 100.0).round() as u32;

    GapReport {
        matched,
        gaps,
        ats_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_matched_via_list_or_text() {
        let required = ["Python", "SQL"];
        let parsed = vec!["python".to_string()];
        let raw = "... worked with SQL daily ...";

        let report = score_against_role(&required, &parsed, raw);
        assert_eq!(report.matched, vec!["Python", "SQL"]);
        assert!(report.gaps.is_empty());
        assert_eq!(report.ats_score, 100);
    }

    #[test]
    fn test_empty_required_scores_zero() {
        let report = score_against_role(&[], &["python".to_string()], "anything");
        assert_eq!(report.ats_score, 0);
        assert!(report.matched.is_empty());
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn test_matched_and_gaps_partition_required() {
        let required = ["Docker", "Kubernetes", "Terraform"];
        let parsed = vec!["docker".to_string()];
        let raw = "deployed services to kubernetes clusters";

        let report = score_against_role(&required, &parsed, raw);
        assert_eq!(report.matched.len() + report.gaps.len(), required.len());
        for skill in &required {
            let in_matched = report.matched.iter().any(|m| m == skill);
            let in_gaps = report.gaps.iter().any(|g| g == skill);
            assert!(in_matched ^ in_gaps, "{skill} must be in exactly one bucket");
        }
        assert_eq!(report.gaps, vec!["Terraform"]);
    }

    #[test]
    fn test_score_rounds_to_nearest_integer() {
        // 1 of 3 matched → 33.33… → 33
        let required = ["Python", "SQL", "Django"];
        let report = score_against_role(&required, &["python".to_string()], "");
        assert_eq!(report.ats_score, 33);

        // 2 of 3 matched → 66.66… → 67
        let report = score_against_role(
            &required,
            &["python".to_string(), "sql".to_string()],
            "",
        );
        assert_eq!(report.ats_score, 67);
    }

    #[test]
    fn test_no_synonym_handling() {
        // "JS" does not match "JavaScript" — the heuristic is exact/substring only.
        let required = ["JavaScript"];
        let report = score_against_role(&required, &["JS".to_string()], "knows JS well");
        assert_eq!(report.gaps, vec!["JavaScript"]);
    }

    #[test]
    fn test_skill_match_is_case_insensitive() {
        let required = ["AWS"];
        let report = score_against_role(&required, &[], "experience with aws lambda");
        assert_eq!(report.matched, vec!["AWS"]);
        assert_eq!(report.ats_score, 100);
    }
}
