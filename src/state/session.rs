use super::{score, AppState};
use crate::protocol::QuestionPayload;
use crate::questions::CorrectAnswer;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No question has been presented yet.
    Idle,
    /// A question is live and accepting answers.
    Presenting,
    /// The answer window is closed, the solution has been published.
    AwaitingClose,
    /// The question sequence is exhausted. Terminal until restart.
    Ended,
}

/// Single-session quiz progression. Invariant: at most one question is live
/// at any time, and each participant gets at most one scored answer per
/// question.
#[derive(Debug)]
pub struct Session {
    pub phase: Phase,
    /// `None` until the first question is presented.
    pub current_index: Option<usize>,
    presented_at: Option<Instant>,
    answered: HashSet<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            current_index: None,
            presented_at: None,
            answered: HashSet::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("the quiz has already ended")]
    Ended,
    #[error("no question is currently accepting answers")]
    NotPresenting,
    #[error("answer targets question {got}, current is {current:?}")]
    QuestionMismatch { current: Option<usize>, got: usize },
    #[error("{0} already answered this question")]
    AlreadyAnswered(String),
}

/// Outcome of a host advance.
#[derive(Debug)]
pub enum Advance {
    Question {
        payload: QuestionPayload,
        /// Presentation time in epoch milliseconds.
        timestamp: u64,
    },
    /// The sequence is exhausted; carries the final ranked ledger.
    Finished { scores: IndexMap<String, i64> },
}

/// Data published when the host closes a question.
#[derive(Debug)]
pub struct Solution {
    pub correct_answer: CorrectAnswer,
    pub tolerance: Option<f64>,
    pub scores: IndexMap<String, i64>,
}

impl AppState {
    /// Advance to the next question, or end the session when the sequence is
    /// exhausted. Advancing past a still-open question abandons it; only a
    /// session that has ended rejects the command.
    pub async fn advance(&self) -> Result<Advance, SessionError> {
        let mut session = self.session.write().await;
        if session.phase == Phase::Ended {
            return Err(SessionError::Ended);
        }

        let next = session.current_index.map_or(0, |i| i + 1);
        if next >= self.questions.len() {
            session.phase = Phase::Ended;
            drop(session);
            return Ok(Advance::Finished {
                scores: self.ranked_scores().await,
            });
        }

        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        session.phase = Phase::Presenting;
        session.current_index = Some(next);
        session.presented_at = Some(Instant::now());
        session.answered.clear();

        Ok(Advance::Question {
            payload: QuestionPayload::new(&self.questions[next], next),
            timestamp,
        })
    }

    /// Close the live question's answer window and assemble the solution
    /// broadcast. Legal only while a question is live; repeated requests are
    /// rejected.
    pub async fn close_question(&self) -> Result<Solution, SessionError> {
        let mut session = self.session.write().await;
        if session.phase != Phase::Presenting {
            return Err(SessionError::NotPresenting);
        }
        let Some(index) = session.current_index else {
            return Err(SessionError::NotPresenting);
        };
        session.phase = Phase::AwaitingClose;
        drop(session);

        let question = &self.questions[index];
        Ok(Solution {
            correct_answer: question.correct_answer.clone(),
            tolerance: question.tolerance,
            scores: self.scores_snapshot().await,
        })
    }

    /// Score a participant's answer to the live question. The first
    /// submission consumes the participant's attempt for this question,
    /// correct or not; later ones fail with [`SessionError::AlreadyAnswered`].
    pub async fn submit_answer(
        &self,
        name: &str,
        question_index: usize,
        answer: &serde_json::Value,
    ) -> Result<i64, SessionError> {
        let elapsed_ms = {
            let mut session = self.session.write().await;
            if session.phase != Phase::Presenting {
                return Err(SessionError::NotPresenting);
            }
            if session.current_index != Some(question_index) {
                return Err(SessionError::QuestionMismatch {
                    current: session.current_index,
                    got: question_index,
                });
            }
            if session.answered.contains(name) {
                return Err(SessionError::AlreadyAnswered(name.to_string()));
            }
            session.answered.insert(name.to_string());
            session
                .presented_at
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0)
        };

        let question = &self.questions[question_index];
        let correct = score::evaluate(question, answer);
        let points = score::award(correct, elapsed_ms);
        if correct {
            self.add_points(name, points).await;
        }
        Ok(points)
    }

    /// Revert to the initial session state when the room empties mid-quiz.
    /// An ended session stays ended.
    pub(super) async fn reset_session_if_unfinished(&self) {
        let mut session = self.session.write().await;
        if session.phase != Phase::Ended {
            *session = Session::new();
        }
    }
}
