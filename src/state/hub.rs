//! Connection table and room protocol core
//!
//! Every inbound event is applied to the [`Hub`] while holding its lock, so
//! one event's broadcasts finish before the next event is looked at. Nothing
//! in here awaits: outbound messages go into per-connection bounded queues
//! that the socket tasks drain. A full queue drops the message.

use super::groups::{MemoryRoomGroups, RoomGroups};
use super::registry::SessionRegistry;
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Messages a connection may have queued before further ones are dropped
pub const OUTBOX_CAPACITY: usize = 64;

/// Outbound queue for a single connection
pub type Outbox = mpsc::Sender<ServerMessage>;

struct Connection {
    outbox: Outbox,
    state: ConnectionState,
}

pub struct Hub {
    connections: HashMap<ConnectionId, Connection>,
    pub(crate) registry: SessionRegistry,
    pub(crate) groups: Box<dyn RoomGroups>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::with_groups(Box::new(MemoryRoomGroups::new()))
    }

    pub fn with_groups(groups: Box<dyn RoomGroups>) -> Self {
        Self {
            connections: HashMap::new(),
            registry: SessionRegistry::new(),
            groups,
        }
    }

    /// Register a freshly established channel and return its id
    pub fn connect(&mut self, outbox: Outbox) -> ConnectionId {
        let connection_id = new_connection_id();
        self.connections.insert(
            connection_id.clone(),
            Connection {
                outbox,
                state: ConnectionState::Unjoined,
            },
        );
        connection_id
    }

    /// Any id that is not live (including ones never issued) reports `Closed`
    pub fn state_of(&self, connection_id: &str) -> ConnectionState {
        self.connections
            .get(connection_id)
            .map(|c| c.state)
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.groups.room_count()
    }

    pub fn display_name(&self, connection_id: &str) -> Option<String> {
        self.registry.lookup(connection_id)
    }

    /// One entry per connection currently in the room, in group order
    pub fn list_members(&self, room_id: &str) -> Vec<Member> {
        self.groups
            .members_of(room_id)
            .into_iter()
            .map(|connection_id| {
                let display_name = self.registry.lookup(&connection_id);
                Member {
                    connection_id,
                    display_name,
                }
            })
            .collect()
    }

    /// Queue a message for one connection. Returns false if the connection
    /// is gone, its socket task stopped draining, or its queue is full.
    pub fn send_to(&self, connection_id: &str, msg: ServerMessage) -> bool {
        let Some(conn) = self.connections.get(connection_id) else {
            return false;
        };
        match conn.outbox.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Outbox full for {}, message dropped", connection_id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Record the participant, add it to the room, then tell every member
    /// (the joiner included) who is in the room now.
    pub fn join(
        &mut self,
        connection_id: &str,
        room_id: &str,
        display_name: Option<String>,
    ) -> Vec<Member> {
        let Some(conn) = self.connections.get_mut(connection_id) else {
            tracing::warn!("Join from unknown connection {}", connection_id);
            return Vec::new();
        };
        conn.state = ConnectionState::Joined;

        self.registry.record(connection_id, display_name.clone());
        self.groups.join(connection_id, room_id);

        let members = self.list_members(room_id);
        let notification = ServerMessage::Joined {
            members: members.clone(),
            display_name,
            connection_id: connection_id.to_string(),
        };
        self.broadcast_to_room(room_id, None, &notification);
        members
    }

    /// Announce the departure to every room the connection is in, then drop
    /// it from its rooms, the registry and the connection table.
    ///
    /// Returns the rooms that were notified. Calling this twice for the same
    /// connection only has an effect the first time.
    pub fn depart(&mut self, connection_id: &str) -> Vec<RoomId> {
        if !self.connections.contains_key(connection_id) {
            return Vec::new();
        }

        let rooms = self.groups.rooms_of(connection_id);
        let notification = ServerMessage::Disconnected {
            connection_id: connection_id.to_string(),
            display_name: self.registry.lookup(connection_id),
        };
        for room_id in &rooms {
            self.broadcast_to_room(room_id, Some(connection_id), &notification);
        }

        for room_id in &rooms {
            self.groups.leave(connection_id, room_id);
        }
        self.registry.remove(connection_id);
        self.connections.remove(connection_id);
        rooms
    }
}
