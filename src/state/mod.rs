pub mod groups;
pub mod hub;
pub mod registry;

use crate::execute::{ExecuteConfig, Executor};
use crate::protocol::ServerMessage;
use crate::types::*;
use groups::RoomGroups;
use hub::{Hub, OUTBOX_CAPACITY};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Connections, rooms and names. Locked for the whole handling of one
    /// inbound event so room events are processed one at a time.
    pub hub: Arc<Mutex<Hub>>,
    /// Forwarder for the code execution endpoint (never touches the hub)
    pub executor: Arc<Executor>,
}

impl AppState {
    pub fn new() -> Self {
        Self::new_with_executor(ExecuteConfig::default())
    }

    pub fn new_with_executor(config: ExecuteConfig) -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub::new())),
            executor: Arc::new(Executor::new(config)),
        }
    }

    /// State backed by a custom group membership service
    pub fn with_groups(groups: Box<dyn RoomGroups>) -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub::with_groups(groups))),
            executor: Arc::new(Executor::new(ExecuteConfig::default())),
        }
    }

    /// Register a new channel. The returned receiver yields everything the
    /// protocol wants delivered to it.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        let connection_id = self.hub.lock().await.connect(tx);
        tracing::debug!("Connection registered: {}", connection_id);
        (connection_id, rx)
    }

    /// Run the departure sequence for a closed channel
    pub async fn disconnect(&self, connection_id: &str) -> Vec<RoomId> {
        let rooms = self.hub.lock().await.depart(connection_id);
        if !rooms.is_empty() {
            tracing::info!(
                "Connection {} left rooms: {}",
                connection_id,
                rooms.join(", ")
            );
        }
        rooms
    }

    pub async fn list_members(&self, room_id: &str) -> Vec<Member> {
        self.hub.lock().await.list_members(room_id)
    }

    pub async fn connection_state(&self, connection_id: &str) -> ConnectionState {
        self.hub.lock().await.state_of(connection_id)
    }

    pub async fn display_name(&self, connection_id: &str) -> Option<String> {
        self.hub.lock().await.display_name(connection_id)
    }

    /// (live connections, non-empty rooms)
    pub async fn stats(&self) -> (usize, usize) {
        let hub = self.hub.lock().await;
        (hub.connection_count(), hub.room_count())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
