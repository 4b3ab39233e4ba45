//! Error types for the hirevox core services.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from the collaborator calls (resume parsing, report generation).
///
/// JSON-shape failures are propagated, never swallowed: a malformed report
/// must not be displayed as if it were valid.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("API key not found in environment (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed JSON from model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model returned no content")]
    EmptyResponse,
}
