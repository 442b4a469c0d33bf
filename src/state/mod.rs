mod registry;
pub mod score;
mod session;

pub use registry::{Registry, RegistryError};
pub use session::{Advance, Phase, Session, SessionError, Solution};

use crate::config::QuizConfig;
use crate::protocol::ServerMessage;
use crate::questions::Question;
use axum::extract::ws::Message;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state, threaded through every handler. Mutation is
/// confined to the lock-guarded fields; the question sequence is immutable
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<QuizConfig>,
    pub questions: Arc<Vec<Question>>,
    pub session: Arc<RwLock<Session>>,
    pub registry: Arc<RwLock<Registry>>,
    /// Score ledger. Entries outlive connections: a participant who drops
    /// and reconnects under the same name keeps their score.
    pub scores: Arc<RwLock<IndexMap<String, i64>>>,
}

impl AppState {
    pub fn new(questions: Vec<Question>, config: QuizConfig) -> Self {
        Self {
            config: Arc::new(config),
            questions: Arc::new(questions),
            session: Arc::new(RwLock::new(Session::new())),
            registry: Arc::new(RwLock::new(Registry::new())),
            scores: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Best-effort fan-out to every live participant. The payload is
    /// serialized once; sends to closed connections are skipped without
    /// retry or delivery confirmation.
    pub async fn send_to_all(&self, msg: &ServerMessage) {
        let payload = match serde_json::to_string(msg) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("failed to serialize broadcast: {err}");
                return;
            }
        };

        let registry = self.registry.read().await;
        for (name, tx) in registry.senders() {
            if tx.send(Message::Text(payload.clone().into())).is_err() {
                tracing::debug!("skipping closed connection of {name}");
            }
        }
    }

    /// Best-effort targeted send, same contract as [`Self::send_to_all`].
    pub async fn send_to_user(&self, name: &str, msg: &ServerMessage) {
        let payload = match serde_json::to_string(msg) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("failed to serialize message for {name}: {err}");
                return;
            }
        };

        let registry = self.registry.read().await;
        if let Some(tx) = registry.sender_for(name) {
            if tx.send(Message::Text(payload.into())).is_err() {
                tracing::debug!("skipping closed connection of {name}");
            }
        }
    }
}
