//! Participant flows: identification, answer submission and countdown
//! queries.

use crate::protocol::ServerMessage;
use crate::state::{AppState, RegistryError};
use std::sync::Arc;

use super::ConnectionHandle;

pub async fn handle_login(
    state: &Arc<AppState>,
    conn: &ConnectionHandle,
    username: String,
) -> Option<ServerMessage> {
    if state.name_for_conn(&conn.id).await.is_some() {
        tracing::debug!("connection {} is already identified, ignoring login", conn.id);
        return None;
    }

    match state.register_connection(&username, &conn.id, &conn.tx).await {
        Ok(true) => {
            tracing::info!("{username} joined and was assigned the host role");
            Some(ServerMessage::Admin)
        }
        Ok(false) => {
            tracing::info!("{username} joined");
            None
        }
        Err(err @ RegistryError::DuplicateConnection(_)) => {
            tracing::warn!("rejecting login: {err}");
            None
        }
    }
}

pub async fn handle_answer(
    state: &Arc<AppState>,
    conn: &ConnectionHandle,
    username: String,
    question_index: usize,
    answer: serde_json::Value,
) -> Option<ServerMessage> {
    // An answer is also an identifying message: an unknown connection is
    // registered under the carried username before the answer is processed.
    let bound = match state.name_for_conn(&conn.id).await {
        Some(name) => name,
        None => match state.register_connection(&username, &conn.id, &conn.tx).await {
            Ok(became_host) => {
                if became_host {
                    conn.send(&ServerMessage::Admin);
                }
                username.clone()
            }
            Err(err) => {
                tracing::warn!(
                    "dropping answer from unidentified connection {}: {err}",
                    conn.id
                );
                return None;
            }
        },
    };

    if bound != username {
        tracing::warn!(
            "dropping answer: username {username:?} does not match connection identity {bound:?}"
        );
        return None;
    }

    match state.submit_answer(&bound, question_index, &answer).await {
        Ok(points) => {
            tracing::info!("{bound} answered question {question_index} for {points} points")
        }
        Err(err) => tracing::debug!("ignoring answer from {bound}: {err}"),
    }
    None
}

/// Report the fixed countdown for the current question. Not a monotonic
/// server-tracked value: repeated queries get the same constant.
pub fn handle_request_time(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::Time {
        time_left: state.config.countdown_secs,
    })
}
