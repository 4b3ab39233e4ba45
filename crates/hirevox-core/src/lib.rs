//! hirevox-core: shared types, prompts, and the Gemini collaborator calls.
//!
//! The voice session crate (`hirevox-voice`) and the CLI both depend on this
//! crate for the candidate profile, the committed interview turns, and the
//! two unary model calls (resume parsing, report generation).

mod error;
mod gemini;
mod shared;

pub mod prompts;

pub use error::{CoreError, CoreResult};
pub use gemini::{api_key_from_env, GeminiClient, REPORT_MODEL, RESUME_MODEL};
pub use shared::{CandidateProfile, FinalReport, OverallScores, Turn};
