use serde::{Deserialize, Serialize};

/// Opaque ID types
pub type ConnectionId = String;
pub type RoomId = String;

/// Lifecycle of one WebSocket connection as seen by the room protocol
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Channel established, no join processed yet
    Unjoined,
    /// At least one join processed
    Joined,
    /// Channel closed (terminal, the id is never reused)
    Closed,
}

/// One entry of a room's member list: the connection plus the name it joined with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub display_name: Option<String>,
}

impl Member {
    pub fn new(connection_id: impl Into<ConnectionId>, display_name: Option<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            display_name,
        }
    }
}

/// Generate a fresh connection identifier
pub fn new_connection_id() -> ConnectionId {
    ulid::Ulid::new().to_string()
}

/// Generate a fresh room token
pub fn new_room_id() -> RoomId {
    ulid::Ulid::new().to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        let a = new_connection_id();
        let b = new_connection_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn test_room_id_is_lowercase() {
        let room = new_room_id();
        assert_eq!(room, room.to_lowercase());
        assert!(!room.is_empty());
    }

    #[test]
    fn test_connection_state_serialization() {
        let json = serde_json::to_string(&ConnectionState::Unjoined).unwrap();
        assert_eq!(json, "\"UNJOINED\"");
    }
}
