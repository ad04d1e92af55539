//! Room protocol handlers
//!
//! Each handler runs with the hub already locked by the dispatcher, so the
//! whole effect of one message (every broadcast included) lands before the
//! next message is looked at. None of them acknowledge anything; replies only
//! happen through room broadcasts.

use crate::protocol::ServerMessage;
use crate::state::hub::Hub;
use crate::types::ConnectionState;

/// Protocol misuse is tolerated, just noted in the logs
fn note_if_unjoined(hub: &Hub, connection_id: &str, action: &str) {
    if hub.state_of(connection_id) == ConnectionState::Unjoined {
        tracing::debug!("{} from {} before joining any room", action, connection_id);
    }
}

pub fn handle_join(
    hub: &mut Hub,
    connection_id: &str,
    room_id: String,
    display_name: Option<String>,
) -> Option<ServerMessage> {
    if hub.state_of(connection_id) == ConnectionState::Joined {
        tracing::info!(
            "Re-join by {} to room {} as {:?}",
            connection_id,
            room_id,
            display_name
        );
    } else {
        tracing::info!(
            "Join by {} to room {} as {:?}",
            connection_id,
            room_id,
            display_name
        );
    }

    let members = hub.join(connection_id, &room_id, display_name);
    tracing::debug!("Room {} now has {} members", room_id, members.len());
    None
}

pub fn handle_code_change(
    hub: &mut Hub,
    connection_id: &str,
    room_id: String,
    content: Option<String>,
) -> Option<ServerMessage> {
    note_if_unjoined(hub, connection_id, "Code change");
    let delivered = hub.broadcast_to_room(
        &room_id,
        Some(connection_id),
        &ServerMessage::CodeChange { content },
    );
    tracing::debug!(
        "Code change from {} relayed to {} peers in room {}",
        connection_id,
        delivered,
        room_id
    );
    None
}

pub fn handle_output_change(
    hub: &mut Hub,
    connection_id: &str,
    room_id: String,
    output: Option<String>,
) -> Option<ServerMessage> {
    note_if_unjoined(hub, connection_id, "Output change");
    let delivered = hub.broadcast_to_room(
        &room_id,
        Some(connection_id),
        &ServerMessage::OutputChange { output },
    );
    tracing::debug!(
        "Output from {} relayed to {} peers in room {}",
        connection_id,
        delivered,
        room_id
    );
    None
}

/// Deliver `content` to exactly one connection. The target is trusted to be
/// a fellow member; no room check is made.
pub fn handle_sync_code(
    hub: &mut Hub,
    connection_id: &str,
    target_connection_id: String,
    content: Option<String>,
) -> Option<ServerMessage> {
    note_if_unjoined(hub, connection_id, "Sync request");
    if target_connection_id == connection_id {
        tracing::debug!("Self-targeted sync from {}", connection_id);
    }

    if !hub.send_to(&target_connection_id, ServerMessage::CodeChange { content }) {
        tracing::debug!(
            "Sync from {} to {} dropped, target not connected",
            connection_id,
            target_connection_id
        );
    }
    None
}

pub fn handle_leave(hub: &mut Hub, connection_id: &str) -> Option<ServerMessage> {
    let rooms = hub.depart(connection_id);
    tracing::info!(
        "Connection {} left explicitly ({} rooms notified)",
        connection_id,
        rooms.len()
    );
    None
}
