//! Read-only HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{domain::RoomId, infrastructure::dto::RoomSummaryDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of active rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.service.rooms().await;
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get one active room by ID (debug snapshot, roles hidden)
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummaryDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match state.service.room(&room_id).await {
        Some(room) => Ok(Json(RoomSummaryDto::from(&room))),
        None => Err(StatusCode::NOT_FOUND),
    }
}
