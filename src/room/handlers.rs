use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::RoomSummary;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing active rooms with participant counts
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = state.registry.list_rooms().await?;
    let summaries: Vec<RoomSummary> = rooms.iter().map(RoomSummary::from).collect();

    info!(room_count = summaries.len(), "Rooms listed");

    Ok(Json(summaries))
}

/// HTTP handler for fetching a single room's participant count and metadata
///
/// GET /rooms/{room_id}
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummary>, AppError> {
    let room = state
        .registry
        .get_room(&room_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;

    Ok(Json(RoomSummary::from(&room)))
}

/// Liveness probe
///
/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
