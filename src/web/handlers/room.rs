//! Room handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::db::RoomRepository;
use crate::web::dto::{ApiResponse, CreateRoomRequest, RoomResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/rooms - List all rooms.
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<RoomResponse>>>, ApiError> {
    let rooms = RoomRepository::new(state.db.pool()).list().await?;
    let responses = rooms.into_iter().map(RoomResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/rooms - Create a room.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomResponse>>), ApiError> {
    let room = RoomRepository::new(state.db.pool())
        .create(req.name.trim())
        .await?;
    tracing::info!(room_id = room.id, name = %room.name, "Room created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(RoomResponse::from(room))),
    ))
}

/// GET /api/rooms/:id - Get one room.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<ApiResponse<RoomResponse>>, ApiError> {
    let room = RoomRepository::new(state.db.pool())
        .get_by_id(room_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Room not found"))?;

    Ok(Json(ApiResponse::new(RoomResponse::from(room))))
}
