use crate::questions::{CorrectAnswer, Question};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Messages accepted from connected clients. Unknown tags deserialize to
/// [`ClientMessage::Unknown`] and are dropped at the dispatch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Login {
        username: String,
    },
    /// Host-only: advance to the next question. `category: "guess"` selects
    /// the estimation flow, which clears client inputs first.
    NextQuestion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Answer {
        username: String,
        question_index: usize,
        /// Raw JSON value: an option index for selection questions, a number
        /// for estimation questions. Anything else scores as incorrect.
        answer: serde_json::Value,
    },
    RequestTime,
    /// Host-only: close the current question and publish the solution.
    #[serde(rename = "solution-request")]
    SolutionRequest,
    #[serde(other)]
    Unknown,
}

/// Messages sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent to a participant when they are assigned the host role.
    Admin,
    Question {
        data: QuestionPayload,
        /// Presentation time in epoch milliseconds; answer latency is
        /// measured against it.
        timestamp: u64,
    },
    #[serde(rename_all = "camelCase")]
    Time {
        time_left: u32,
    },
    #[serde(rename_all = "camelCase")]
    AnswerFeedback {
        correct_answer: CorrectAnswer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<f64>,
        scores: IndexMap<String, i64>,
    },
    /// Final ranked ledger, descending by score.
    Results {
        scores: IndexMap<String, i64>,
    },
    /// Live participant names in registration order.
    UserList {
        users: Vec<String>,
    },
    /// Tells estimation clients to reset their input fields.
    #[serde(rename = "guessclear")]
    GuessClear,
}

/// Public projection of a question: the correct-answer specification and
/// tolerance are withheld until the host publishes the solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
    pub index: usize,
}

impl QuestionPayload {
    pub fn new(question: &Question, index: usize) -> Self {
        Self {
            question: question.question.clone(),
            category: question.category.clone(),
            answers: question.answers.clone(),
            index,
        }
    }
}
