//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! The hub is locked once per message and handed to the room handlers.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ConnectionState;
use std::sync::Arc;

use super::room;

/// Handle a client message and return an optional direct reply to the sender
pub async fn handle_message(
    msg: ClientMessage,
    connection_id: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    let mut hub = state.hub.lock().await;

    if hub.state_of(connection_id) == ConnectionState::Closed {
        tracing::warn!("Message from closed connection {} ignored", connection_id);
        return Some(ServerMessage::Error {
            code: "CONNECTION_CLOSED".to_string(),
            msg: "Connection is closed".to_string(),
        });
    }

    match msg {
        ClientMessage::Join {
            room_id,
            display_name,
        } => room::handle_join(&mut hub, connection_id, room_id, display_name),

        ClientMessage::CodeChange { room_id, content } => {
            room::handle_code_change(&mut hub, connection_id, room_id, content)
        }

        ClientMessage::SyncCode {
            target_connection_id,
            content,
        } => room::handle_sync_code(&mut hub, connection_id, target_connection_id, content),

        ClientMessage::OutputChange { room_id, output } => {
            room::handle_output_change(&mut hub, connection_id, room_id, output)
        }

        ClientMessage::Leave => room::handle_leave(&mut hub, connection_id),
    }
}
