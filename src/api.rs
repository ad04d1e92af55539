//! Small HTTP endpoints next to the WebSocket.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::{new_room_id, RoomId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Live WebSocket connections
    pub connections: usize,
    /// Rooms with at least one member
    pub rooms: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoomResponse {
    pub room_id: RoomId,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (connections, rooms) = state.stats().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        connections,
        rooms,
    })
}

/// Hand out a fresh room token. Nothing is reserved; the room exists once
/// somebody joins it.
///
/// GET /api/rooms/new
pub async fn new_room() -> Json<NewRoomResponse> {
    Json(NewRoomResponse {
        room_id: new_room_id(),
    })
}
