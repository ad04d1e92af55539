//! Room group membership
//!
//! The protocol never keeps its own copy of who is in which room; it asks a
//! [`RoomGroups`] implementation. The in-memory one is what the server uses,
//! tests can swap in their own.

use crate::types::{ConnectionId, RoomId};
use std::collections::HashMap;

/// Group membership service keyed by room token
pub trait RoomGroups: Send + Sync {
    /// Add a connection to a room. Joining twice is a no-op.
    fn join(&mut self, connection_id: &str, room_id: &str);

    /// Remove a connection from a room. Leaving a room it is not in is a no-op.
    fn leave(&mut self, connection_id: &str, room_id: &str);

    /// Connections currently in the room, in a stable order
    fn members_of(&self, room_id: &str) -> Vec<ConnectionId>;

    /// Rooms the connection currently belongs to
    fn rooms_of(&self, connection_id: &str) -> Vec<RoomId>;

    /// Number of rooms with at least one member
    fn room_count(&self) -> usize;
}

/// In-process group table. Members are kept in join order and a room
/// disappears with its last member.
#[derive(Debug, Default)]
pub struct MemoryRoomGroups {
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
    memberships: HashMap<ConnectionId, Vec<RoomId>>,
}

impl MemoryRoomGroups {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomGroups for MemoryRoomGroups {
    fn join(&mut self, connection_id: &str, room_id: &str) {
        let members = self.rooms.entry(room_id.to_string()).or_default();
        if members.iter().any(|m| m == connection_id) {
            return;
        }
        members.push(connection_id.to_string());
        self.memberships
            .entry(connection_id.to_string())
            .or_default()
            .push(room_id.to_string());
    }

    fn leave(&mut self, connection_id: &str, room_id: &str) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.retain(|m| m != connection_id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
        if let Some(rooms) = self.memberships.get_mut(connection_id) {
            rooms.retain(|r| r != room_id);
            if rooms.is_empty() {
                self.memberships.remove(connection_id);
            }
        }
    }

    fn members_of(&self, room_id: &str) -> Vec<ConnectionId> {
        self.rooms.get(room_id).cloned().unwrap_or_default()
    }

    fn rooms_of(&self, connection_id: &str) -> Vec<RoomId> {
        self.memberships
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
