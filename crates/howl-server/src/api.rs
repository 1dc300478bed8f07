use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

use howl_core::ids::RoomId;
use howl_core::phase::Phase;
use howl_core::view::RoomSummary;

use crate::error::AppError;
use crate::state::AppState;

/// How long a lobby query waits on any single room before skipping it.
const ROOM_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// GET /api/v1/rooms — lobby listing of joinable (WAITING) rooms.
pub async fn get_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let handles = {
        let registry = state.registry.read().await;
        registry.handles()
    };

    let mut rooms = Vec::new();
    for handle in handles {
        match tokio::time::timeout(ROOM_QUERY_TIMEOUT, handle.stats()).await {
            Ok(Some(stats)) if stats.summary.phase == Phase::Waiting => {
                rooms.push(stats.summary);
            },
            Ok(_) => {},
            Err(_) => {
                tracing::debug!(room = %handle.room_id, "Room stats query timed out");
            },
        }
    }
    rooms.sort_by(|a, b| a.name.cmp(&b.name));
    Json(rooms)
}

/// GET /api/v1/rooms/:room_id/replay — opaque JSON event log for offline
/// playback. The engine records it; it never interprets it.
pub async fn get_replay(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = RoomId::parse(&room_id)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid room id: {room_id}")))?;

    let handle = {
        let registry = state.registry.read().await;
        registry.handle(id)
    };
    let handle = handle.ok_or_else(|| AppError::NotFound(format!("Room {room_id} not found")))?;

    match tokio::time::timeout(ROOM_QUERY_TIMEOUT, handle.replay()).await {
        Ok(Some(replay)) => Ok(Json(replay)),
        _ => Err(AppError::Internal("Room did not answer".to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub rooms: usize,
    pub ws_connections: usize,
}

/// GET /api/v1/status — operational counters, optionally behind a bearer
/// token.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let rooms = {
        let registry = state.registry.read().await;
        registry.len()
    };
    Json(StatusResponse {
        rooms,
        ws_connections: state
            .ws_connection_count
            .load(std::sync::atomic::Ordering::Relaxed),
    })
}
