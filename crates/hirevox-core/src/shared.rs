//! Shared types exchanged between the voice session, the collaborator calls,
//! and the front-end.
//!
//! All wire-facing structs use camelCase field names because the model is
//! prompted to return JSON in exactly that shape.

use serde::{Deserialize, Serialize};

/// Structured candidate profile extracted from raw resume text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub experience_years: f32,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub seniority: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// One committed question/answer exchange. Immutable after commit; the
/// session's turn list preserves commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Score breakdown inside the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScores {
    #[serde(default)]
    pub technical_knowledge: f32,
    #[serde(default)]
    pub problem_solving: f32,
    #[serde(default)]
    pub communication: f32,
    #[serde(default)]
    pub confidence: f32,
}

/// The structured assessment returned by the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub overall_scores: OverallScores,
    #[serde(default)]
    pub industry_readiness: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
    #[serde(default)]
    pub hiring_recommendation: String,
    #[serde(default)]
    pub resume_score: f32,
    #[serde(default)]
    pub ats_compatibility: String,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    #[serde(default)]
    pub three_month_plan: Vec<String>,
    #[serde(default)]
    pub recommended_certifications: Vec<String>,
    #[serde(default)]
    pub suitable_job_roles: Vec<String>,
}
