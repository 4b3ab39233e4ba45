//! Transcript accumulation: streamed fragments into committed turns.
//!
//! Two per-turn buffers hold the interviewer's (question) and candidate's
//! (answer) text as fragments stream in. A turn-boundary signal commits a
//! `Turn` only when both sides are non-empty; the session-end flush makes
//! sure partial content is never silently dropped.

use hirevox_core::Turn;
use tracing::debug;

/// Placeholder question when the session ends mid-answer.
const FALLBACK_QUESTION: &str = "Final Session";
/// Placeholder answer when the session ends mid-question.
const FALLBACK_ANSWER: &str = "Completed";

/// Sole owner of the in-progress buffers and the committed turn list.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    question: String,
    answer: String,
    turns: Vec<Turn>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment of the interviewer's speech. Fragments arrive many
    /// times per turn and concatenate in arrival order.
    pub fn push_question_fragment(&mut self, text: &str) {
        self.question.push_str(text);
    }

    /// Append a fragment of the candidate's transcribed speech.
    pub fn push_answer_fragment(&mut self, text: &str) {
        self.answer.push_str(text);
    }

    /// Turn-boundary signal. Commits and clears only when both buffers are
    /// non-empty; otherwise both are left untouched, which guards against
    /// spurious or empty turns.
    pub fn commit_turn(&mut self) {
        if self.question.is_empty() || self.answer.is_empty() {
            debug!("Turn boundary with an empty side; holding buffers");
            return;
        }
        self.turns.push(Turn {
            question: std::mem::take(&mut self.question),
            answer: std::mem::take(&mut self.answer),
        });
        debug!("Turn committed ({} total)", self.turns.len());
    }

    /// Session-end flush: commit whatever is buffered, substituting
    /// placeholder text for an empty side, so ending mid-utterance never
    /// drops partial content.
    pub fn flush(&mut self) {
        if self.question.is_empty() && self.answer.is_empty() {
            return;
        }
        let question = std::mem::take(&mut self.question);
        let answer = std::mem::take(&mut self.answer);
        self.turns.push(Turn {
            question: if question.is_empty() {
                FALLBACK_QUESTION.to_string()
            } else {
                question
            },
            answer: if answer.is_empty() {
                FALLBACK_ANSWER.to_string()
            } else {
                answer
            },
        });
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Hand the ordered turn list off to the finish callback. Moves, not
    /// copies; the accumulator is consumed.
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    #[cfg(test)]
    fn buffers(&self) -> (&str, &str) {
        (&self.question, &self.answer)
    }
}
