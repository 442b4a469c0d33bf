//! Host command flows: question advancement and solution publishing.
//!
//! Authorization is already checked at the dispatch boundary; these handlers
//! only drive the session state machine and fan the results out.

use crate::protocol::ServerMessage;
use crate::state::{score, Advance, AppState};
use std::sync::Arc;

/// Advance the question sequence. An estimation advance clears client
/// inputs first; exhausting the sequence publishes the final ranked ledger.
pub async fn handle_next_question(
    state: &Arc<AppState>,
    category: Option<String>,
) -> Option<ServerMessage> {
    if category.as_deref() == Some("guess") {
        state.send_to_all(&ServerMessage::GuessClear).await;
    }

    match state.advance().await {
        Ok(Advance::Question { payload, timestamp }) => {
            tracing::info!("presenting question {}", payload.index);
            state
                .send_to_all(&ServerMessage::Question {
                    data: payload,
                    timestamp,
                })
                .await;
        }
        Ok(Advance::Finished { scores }) => {
            for (name, points) in &scores {
                tracing::info!(
                    "final standing: #{} {name} with {points} points",
                    score::rank_for(&scores, *points)
                );
            }
            state.send_to_all(&ServerMessage::Results { scores }).await;
        }
        Err(err) => tracing::debug!("ignoring nextQuestion: {err}"),
    }
    None
}

/// Close the live question and publish the solution together with the
/// current ledger, so every client can render feedback locally.
pub async fn handle_solution_request(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.close_question().await {
        Ok(solution) => {
            state
                .send_to_all(&ServerMessage::AnswerFeedback {
                    correct_answer: solution.correct_answer,
                    tolerance: solution.tolerance,
                    scores: solution.scores,
                })
                .await;
        }
        Err(err) => tracing::debug!("ignoring solution-request: {err}"),
    }
    None
}
