use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub raw_text: String,
    pub skills: Vec<String>,
    pub projects: Value,
    pub education: String,
    pub experience: Vec<String>,
    pub ats_score: Option<i32>,
    pub skill_gaps: Option<Vec<String>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One project extracted from a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Structured extraction produced by the resume analyzer model call,
/// plus the derived ATS fields when a target role is known.
///
/// Every field defaults so a partially-shaped model response still parses;
/// a fully malformed response degrades to the empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default, rename = "atsScore")]
    pub ats_score: Option<u32>,
    #[serde(default, rename = "skillGaps")]
    pub skill_gaps: Option<Vec<String>>,
}
