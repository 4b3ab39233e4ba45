//! Gemini collaborator calls: resume parsing and report generation.
//!
//! Both are unary `generateContent` requests with JSON response mode. The
//! realtime interview itself goes over the duplex channel in `hirevox-voice`;
//! this client only covers the request/response surfaces around it.

use crate::error::{CoreError, CoreResult};
use crate::prompts::{report_prompt, RESUME_PARSER_PROMPT};
use crate::shared::{CandidateProfile, FinalReport, Turn};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model for resume-to-profile extraction.
pub const RESUME_MODEL: &str = "gemini-3-flash-preview";
/// Model for the final assessment report.
pub const REPORT_MODEL: &str = "gemini-3-pro-preview";

/// Look up the API key: `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    let key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .ok()?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return None;
    }
    Some(key)
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    text: Option<String>,
}

/// Client for the unary Gemini calls.
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from the environment. Returns `MissingApiKey` when no
    /// key is set.
    pub fn from_env() -> CoreResult<Self> {
        let key = api_key_from_env().ok_or(CoreError::MissingApiKey)?;
        Ok(Self::new(key))
    }

    /// Create a client with an explicit API key.
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            client,
        }
    }

    /// The key this client was built with (the live channel needs it too).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Parse raw resume text into a structured profile.
    pub async fn parse_resume(&self, resume_text: &str) -> CoreResult<CandidateProfile> {
        let prompt = format!("{}\n\nResume Text:\n{}", RESUME_PARSER_PROMPT, resume_text);
        let raw = self.generate_json(RESUME_MODEL, &prompt).await?;
        Ok(serde_json::from_str(strip_code_fences(&raw))?)
    }

    /// Generate the final assessment report from the profile and the ordered
    /// turn list.
    pub async fn generate_report(
        &self,
        profile: &CandidateProfile,
        turns: &[Turn],
    ) -> CoreResult<FinalReport> {
        let prompt = report_prompt(profile, turns);
        let raw = self.generate_json(REPORT_MODEL, &prompt).await?;
        Ok(serde_json::from_str(strip_code_fences(&raw))?)
    }

    /// Single-shot `generateContent` with JSON response mode; returns the
    /// first candidate's text.
    async fn generate_json(&self, model: &str, prompt: &str) -> CoreResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        debug!("generateContent request to {}", model);
        let res = self.client.post(&url).json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Api { status, body });
        }

        let parsed: GenerateContentResponse = res.json().await?;
        parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or(CoreError::EmptyResponse)
    }
}

/// Models occasionally wrap JSON output in markdown fences despite the JSON
/// response mode; strip them before parsing.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn response_text_extraction() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "{\"name\":\"x\"}" }] } }
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .unwrap();
        assert_eq!(text, "{\"name\":\"x\"}");
    }

    #[test]
    fn empty_candidates_is_empty_response() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
