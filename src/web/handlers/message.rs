//! Message handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::db::{MessageRepository, RoomRepository, UserRepository, DEFAULT_RECENT_MESSAGE_COUNT};
use crate::hub::BroadcastMessage;
use crate::web::dto::{
    ApiResponse, MessageResponse, PostMessageRequest, RecentMessagesQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Upper bound for the `limit` query parameter.
const MAX_RECENT_MESSAGE_COUNT: i64 = 500;

async fn require_room(state: &AppState, room_id: i64) -> Result<(), ApiError> {
    RoomRepository::new(state.db.pool())
        .get_by_id(room_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Room not found"))
}

/// GET /api/rooms/:id/messages - Recent messages, oldest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
    Query(query): Query<RecentMessagesQuery>,
) -> Result<Json<ApiResponse<Vec<MessageResponse>>>, ApiError> {
    require_room(&state, room_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_MESSAGE_COUNT)
        .clamp(1, MAX_RECENT_MESSAGE_COUNT);
    let messages = MessageRepository::new(state.db.pool())
        .list_recent(room_id, limit)
        .await?;

    let responses = messages.into_iter().map(MessageResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/rooms/:id/messages - Post a message and broadcast it.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<PostMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    require_room(&state, room_id).await?;

    let author = UserRepository::new(state.db.pool())
        .find_or_create(req.username.trim(), None)
        .await?;
    let stored = MessageRepository::new(state.db.pool())
        .create(room_id, author.id, &req.text)
        .await?;
    tracing::debug!(room_id, message_id = stored.id, "Message posted");

    state.hub.broadcast(BroadcastMessage::from(stored.clone()));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(MessageResponse::from(stored))),
    ))
}
