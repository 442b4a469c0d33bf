use super::AppState;
use crate::protocol::ServerMessage;
use axum::extract::ws::Message;
use indexmap::IndexMap;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already bound to a live connection. Reconnecting under a
    /// name while the old connection is still open is rejected.
    #[error("{0} is already connected")]
    DuplicateConnection(String),
}

/// A live participant. The gateway owns the socket; the registry only holds
/// the outbound sender for addressing.
#[derive(Debug)]
struct Participant {
    conn_id: String,
    tx: mpsc::UnboundedSender<Message>,
}

/// Connected participants keyed by display name. Insertion order is
/// registration order, which decides host failover.
#[derive(Debug, Default)]
pub struct Registry {
    participants: IndexMap<String, Participant>,
    host: Option<String>,
}

/// Result of removing a connection from the registry.
#[derive(Debug)]
pub struct Departed {
    pub name: String,
    pub was_host: bool,
    /// Set when the host role moved to another participant.
    pub new_host: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a live connection. Returns `true` when the participant
    /// was assigned the host role because no host existed.
    pub fn register(
        &mut self,
        name: &str,
        conn_id: &str,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Result<bool, RegistryError> {
        if self.participants.contains_key(name) {
            return Err(RegistryError::DuplicateConnection(name.to_string()));
        }

        self.participants.insert(
            name.to_string(),
            Participant {
                conn_id: conn_id.to_string(),
                tx,
            },
        );

        if self.host.is_none() {
            self.host = Some(name.to_string());
            return Ok(true);
        }
        Ok(false)
    }

    /// Remove the participant bound to `conn_id`, if any. A departing host
    /// hands the role to the earliest still-connected participant by
    /// registration order.
    pub fn deregister_conn(&mut self, conn_id: &str) -> Option<Departed> {
        let name = self
            .participants
            .iter()
            .find(|(_, p)| p.conn_id == conn_id)
            .map(|(name, _)| name.clone())?;

        self.participants.shift_remove(&name);

        let was_host = self.host.as_deref() == Some(name.as_str());
        let mut new_host = None;
        if was_host {
            self.host = self.participants.keys().next().cloned();
            new_host = self.host.clone();
        }

        Some(Departed {
            name,
            was_host,
            new_host,
        })
    }

    pub fn name_for_conn(&self, conn_id: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|(_, p)| p.conn_id == conn_id)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_host_conn(&self, conn_id: &str) -> bool {
        self.name_for_conn(conn_id)
            .is_some_and(|name| self.host.as_deref() == Some(name))
    }

    pub fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Live participant names in registration order.
    pub fn users(&self) -> Vec<String> {
        self.participants.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub(super) fn sender_for(&self, name: &str) -> Option<&mpsc::UnboundedSender<Message>> {
        self.participants.get(name).map(|p| &p.tx)
    }

    pub(super) fn senders(&self) -> impl Iterator<Item = (&str, &mpsc::UnboundedSender<Message>)> {
        self.participants
            .iter()
            .map(|(name, p)| (name.as_str(), &p.tx))
    }
}

impl AppState {
    /// Register a connection under `name` and announce the updated user
    /// list. Idempotent on the ledger: an existing score entry is reused, so
    /// reconnecting does not reset a participant's score.
    pub async fn register_connection(
        &self,
        name: &str,
        conn_id: &str,
        tx: &mpsc::UnboundedSender<Message>,
    ) -> Result<bool, RegistryError> {
        let became_host = self
            .registry
            .write()
            .await
            .register(name, conn_id, tx.clone())?;

        self.scores
            .write()
            .await
            .entry(name.to_string())
            .or_insert(0);

        self.broadcast_user_list().await;
        Ok(became_host)
    }

    /// Drop the registry binding for a closed connection. Transfers the host
    /// role when needed and idles the session once the room is empty.
    pub async fn disconnect(&self, conn_id: &str) {
        let departed = self.registry.write().await.deregister_conn(conn_id);
        let Some(departed) = departed else {
            // The connection never identified itself.
            return;
        };

        tracing::info!("{} disconnected", departed.name);

        if let Some(new_host) = &departed.new_host {
            tracing::info!("host role transferred to {new_host}");
            self.send_to_user(new_host, &ServerMessage::Admin).await;
        }

        if self.registry.read().await.is_empty() {
            self.reset_session_if_unfinished().await;
        }

        self.broadcast_user_list().await;
    }

    pub async fn is_host_conn(&self, conn_id: &str) -> bool {
        self.registry.read().await.is_host_conn(conn_id)
    }

    pub async fn name_for_conn(&self, conn_id: &str) -> Option<String> {
        self.registry
            .read()
            .await
            .name_for_conn(conn_id)
            .map(str::to_string)
    }

    async fn broadcast_user_list(&self) {
        let users = self.registry.read().await.users();
        self.send_to_all(&ServerMessage::UserList { users }).await;
    }
}
