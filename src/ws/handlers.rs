//! WebSocket message dispatch
//!
//! Single entry point for inbound messages. Host authorization is checked
//! here before dispatching to the role-specific handler modules. Violations
//! are logged and dropped without a reply so a misbehaving client cannot
//! disturb the running session.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::{host, player, ConnectionHandle};

/// Macro to check host authorization and silently drop the command if the
/// connection does not hold the host role.
macro_rules! require_host {
    ($state:expr, $conn:expr, $action:expr) => {
        if !$state.is_host_conn(&$conn.id).await {
            tracing::debug!("ignoring {} from non-host connection {}", $action, $conn.id);
            return None;
        }
    };
}

/// Handle a client message and return an optional direct reply.
pub async fn handle_message(
    msg: ClientMessage,
    conn: &ConnectionHandle,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Login { username } => player::handle_login(state, conn, username).await,

        ClientMessage::Answer {
            username,
            question_index,
            answer,
        } => player::handle_answer(state, conn, username, question_index, answer).await,

        ClientMessage::RequestTime => player::handle_request_time(state),

        ClientMessage::NextQuestion { category } => {
            require_host!(state, conn, "nextQuestion");
            host::handle_next_question(state, category).await
        }

        ClientMessage::SolutionRequest => {
            require_host!(state, conn, "solution-request");
            host::handle_solution_request(state).await
        }

        ClientMessage::Unknown => {
            tracing::debug!("ignoring unrecognized message from {}", conn.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuizConfig;
    use crate::questions::{CorrectAnswer, Question};
    use crate::state::Phase;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            vec![Question {
                question: "Which option?".to_string(),
                category: None,
                answers: Some(vec!["a".into(), "b".into()]),
                correct_answer: CorrectAnswer::Indices(vec![1]),
                tolerance: None,
            }],
            QuizConfig::default(),
        ))
    }

    fn connection() -> (ConnectionHandle, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = ConnectionHandle {
            id: ulid::Ulid::new().to_string(),
            tx,
        };
        (conn, rx)
    }

    #[tokio::test]
    async fn test_first_login_becomes_host() {
        let state = test_state();
        let (conn, _rx) = connection();

        let reply = handle_message(
            ClientMessage::Login {
                username: "anna".to_string(),
            },
            &conn,
            &state,
        )
        .await;

        assert!(matches!(reply, Some(ServerMessage::Admin)));
        assert!(state.is_host_conn(&conn.id).await);
    }

    #[tokio::test]
    async fn test_second_login_is_not_host() {
        let state = test_state();
        let (host_conn, _host_rx) = connection();
        let (player_conn, _player_rx) = connection();

        handle_message(
            ClientMessage::Login {
                username: "anna".to_string(),
            },
            &host_conn,
            &state,
        )
        .await;

        let reply = handle_message(
            ClientMessage::Login {
                username: "ben".to_string(),
            },
            &player_conn,
            &state,
        )
        .await;

        assert!(reply.is_none());
        assert!(!state.is_host_conn(&player_conn.id).await);
    }

    #[tokio::test]
    async fn test_non_host_next_question_is_dropped() {
        let state = test_state();
        let (host_conn, _host_rx) = connection();
        let (player_conn, _player_rx) = connection();

        handle_message(
            ClientMessage::Login {
                username: "anna".to_string(),
            },
            &host_conn,
            &state,
        )
        .await;
        handle_message(
            ClientMessage::Login {
                username: "ben".to_string(),
            },
            &player_conn,
            &state,
        )
        .await;

        let reply =
            handle_message(ClientMessage::NextQuestion { category: None }, &player_conn, &state)
                .await;

        assert!(reply.is_none());
        assert_eq!(state.session.read().await.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_request_time_replies_with_countdown() {
        let state = test_state();
        let (conn, _rx) = connection();

        let reply = handle_message(ClientMessage::RequestTime, &conn, &state).await;

        assert!(matches!(reply, Some(ServerMessage::Time { time_left: 10 })));
    }

    #[tokio::test]
    async fn test_unknown_message_is_dropped() {
        let state = test_state();
        let (conn, _rx) = connection();

        let reply = handle_message(ClientMessage::Unknown, &conn, &state).await;
        assert!(reply.is_none());
    }
}
