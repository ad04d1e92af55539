//! Client side of the room protocol
//!
//! [`SessionController`] is the transport-free part: it mirrors the document
//! and member list and decides what to send in response to server messages.
//! [`ClientSession`] drives a controller over any [`Transport`] in a
//! background task.

mod controller;
mod session;
mod transport;

pub use controller::{Reaction, SessionController, SessionEvent};
pub use session::ClientSession;
pub use transport::{Transport, WsTransport};

pub use crate::types::new_room_id;

/// Errors that can occur on the client side
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Room id is required")]
    MissingRoomId,

    #[error("Display name is required")]
    MissingDisplayName,

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Transport send failed: {0}")]
    TransportSend(String),

    #[error("Transport receive failed: {0}")]
    TransportReceive(String),

    #[error("Session is closed")]
    Closed,

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where to join and under which name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub room_id: String,
    pub display_name: String,
}

impl JoinParams {
    pub fn new(room_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Both fields must be non-blank before a channel is opened.
    /// The server itself accepts anything.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.room_id.trim().is_empty() {
            return Err(ClientError::MissingRoomId);
        }
        if self.display_name.trim().is_empty() {
            return Err(ClientError::MissingDisplayName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_params_validation() {
        assert!(JoinParams::new("r1", "Alice").validate().is_ok());
        assert!(matches!(
            JoinParams::new("  ", "Alice").validate(),
            Err(ClientError::MissingRoomId)
        ));
        assert!(matches!(
            JoinParams::new("r1", "").validate(),
            Err(ClientError::MissingDisplayName)
        ));
    }

    #[test]
    fn test_generated_room_ids_differ() {
        assert_ne!(new_room_id(), new_room_id());
    }
}
