//! Question store
//!
//! Loads the ordered question list from a JSON file once at startup. The
//! sequence is immutable for the lifetime of the process; a load failure is
//! fatal and must abort startup before any connection is accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum QuestionsError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question file contains no questions")]
    Empty,
}

/// Correct-answer specification: a set of correct option indices for
/// selection questions, or a single target number for estimation questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Target(f64),
    Indices(Vec<i64>),
}

/// A single question record as it appears in the question file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    /// `"guess"` marks an estimation question; absence or any other value
    /// marks a selection question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Ordered option list (selection questions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: CorrectAnswer,
    /// Tolerance band around the target (estimation questions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl Question {
    pub fn is_estimation(&self) -> bool {
        self.category.as_deref() == Some("guess")
    }
}

/// Load the question sequence from `path`. Any failure here is fatal to the
/// caller; the server must not start with a missing or malformed file.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, QuestionsError> {
    let data = std::fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&data)?;
    if questions.is_empty() {
        return Err(QuestionsError::Empty);
    }
    Ok(questions)
}
